//! Background [`Task`]s definitions.

mod background;
pub mod refresh_currency_rates;

pub use common::Handler as Task;

pub use self::{
    background::Background, refresh_currency_rates::RefreshCurrencyRates,
};
