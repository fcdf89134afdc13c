mod buffered;
mod tokio_postgres;

pub use self::buffered::BufferedResult;
pub use self::in_memory_test::{
    InMemoryTestDriver, InMemoryTestResponseBuilder, RecordedQuery, TestResponse,
};
pub use self::tokio_postgres::{PgResultHandle, TokioPostgresDriver};
