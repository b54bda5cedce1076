//! [`Deal`] read model definition.
//!
//! [`Deal`]: crate::domain::Deal

pub mod list {
    //! [`Deal`]s list definitions.

    use crate::domain::{
        deal, organization,
        period::{Interval, Scope},
    };
    #[cfg(doc)]
    use crate::domain::Deal;

    /// Criteria of selecting a list of [`Deal`]s.
    #[derive(Clone, Debug)]
    pub struct Selector {
        /// ID of the organization the [`Deal`]s belong to.
        pub organization_id: organization::Id,

        /// [`Interval`] the [`Deal`]s were made within.
        pub interval: Interval,

        /// [`Scope`] narrowing the [`Deal`]s.
        pub scope: Scope,

        /// [`deal::Client`] (or its part) to fuzzy search for.
        pub client: Option<deal::Client>,
    }
}
