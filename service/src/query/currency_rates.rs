//! [`CurrencyRates`] definition.

use std::convert::Infallible;

use common::Currency;

use crate::{domain::currency::Rates, Query, Service};

/// [`Query`] of the latest known currency [`Rates`] re-expressed relative to
/// the provided anchor [`Currency`].
///
/// Served from the snapshot cached by the [`Service`], so it never fails:
/// until the provider is reached, the configured fallback [`Rates`] are used.
#[derive(Clone, Copy, Debug)]
pub struct CurrencyRates {
    /// Anchor [`Currency`] to express the [`Rates`] relative to.
    pub anchor: Currency,
}

impl<Db> Query<CurrencyRates> for Service<Db> {
    type Ok = Rates;
    type Err = Infallible;

    async fn execute(
        &self,
        CurrencyRates { anchor }: CurrencyRates,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.rates().await.anchored_at(anchor))
    }
}
