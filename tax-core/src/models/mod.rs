mod currency;
mod salary;

pub use currency::CurrencyCode;
pub use salary::{SalaryEntry, SalaryParseError};
