mod driver;
mod handle;

pub use driver::DatabaseDriver;
pub use handle::ResultHandle;
