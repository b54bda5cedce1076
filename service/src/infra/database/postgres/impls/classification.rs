//! [`WorkType`]- and [`SourceType`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{
        classification::{self, source_type, work_type, SourceType, WorkType},
        organization,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Implements [`Database`] operations for a classification entity stored in
/// the provided table.
macro_rules! impl_classification {
    ($entity:ident, $module:ident, $table:literal) => {
        impl<C> Database<Select<By<Option<$entity>, $module::Id>>>
            for Postgres<C>
        where
            C: Connection,
        {
            type Ok = Option<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Option<$entity>, $module::Id>>,
            ) -> Result<Self::Ok, Self::Err> {
                let id = by.into_inner();

                const SQL: &str = concat!(
                    "SELECT id, organization_id, name, created_at \
                     FROM ",
                    $table,
                    " WHERE id = $1::UUID",
                );
                Ok(self
                    .query_opt(SQL, &[&id])
                    .await
                    .map_err(tracerr::wrap!())?
                    .map(|row| $entity {
                        id: row.get("id"),
                        organization_id: row.get("organization_id"),
                        name: row.get("name"),
                        created_at: row.get("created_at"),
                    }))
            }
        }

        impl<'n, C>
            Database<
                Select<
                    By<
                        Option<$entity>,
                        (organization::Id, &'n classification::Name),
                    >,
                >,
            > for Postgres<C>
        where
            C: Connection,
        {
            type Ok = Option<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<
                    By<
                        Option<$entity>,
                        (organization::Id, &'n classification::Name),
                    >,
                >,
            ) -> Result<Self::Ok, Self::Err> {
                let (org_id, name) = by.into_inner();

                const SQL: &str = concat!(
                    "SELECT id, organization_id, name, created_at \
                     FROM ",
                    $table,
                    " WHERE organization_id = $1::UUID \
                       AND LOWER(name) = LOWER($2::VARCHAR)",
                );
                Ok(self
                    .query_opt(SQL, &[&org_id, name])
                    .await
                    .map_err(tracerr::wrap!())?
                    .map(|row| $entity {
                        id: row.get("id"),
                        organization_id: row.get("organization_id"),
                        name: row.get("name"),
                        created_at: row.get("created_at"),
                    }))
            }
        }

        impl<C> Database<Select<By<Vec<$entity>, organization::Id>>>
            for Postgres<C>
        where
            C: Connection,
        {
            type Ok = Vec<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Vec<$entity>, organization::Id>>,
            ) -> Result<Self::Ok, Self::Err> {
                let org_id = by.into_inner();

                const SQL: &str = concat!(
                    "SELECT id, organization_id, name, created_at \
                     FROM ",
                    $table,
                    " WHERE organization_id = $1::UUID \
                     ORDER BY name",
                );
                Ok(self
                    .query(SQL, &[&org_id])
                    .await
                    .map_err(tracerr::wrap!())?
                    .into_iter()
                    .map(|row| $entity {
                        id: row.get("id"),
                        organization_id: row.get("organization_id"),
                        name: row.get("name"),
                        created_at: row.get("created_at"),
                    })
                    .collect())
            }
        }

        impl<C> Database<Insert<$entity>> for Postgres<C>
        where
            C: Connection,
        {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Insert(entity): Insert<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                let $entity {
                    id,
                    organization_id,
                    name,
                    created_at,
                } = entity;

                const SQL: &str = concat!(
                    "INSERT INTO ",
                    $table,
                    " (id, organization_id, name, created_at) \
                     VALUES ($1::UUID, $2::UUID, $3::VARCHAR, \
                             $4::TIMESTAMPTZ)",
                );
                self.exec(SQL, &[&id, &organization_id, &name, &created_at])
                    .await
                    .map_err(tracerr::wrap!())
                    .map(drop)
            }
        }
    };
}

impl_classification!(WorkType, work_type, "work_types");
impl_classification!(SourceType, source_type, "source_types");
