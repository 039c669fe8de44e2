pub const ID_FIELD: &str = "_id";

pub const DEFAULT_MONGODB_URL: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "example";

/// Length of the external hex form of a document identifier.
pub const ID_HEX_LEN: usize = 24;
