// Adapters layer: concrete implementations for the model, the report folder and the CSV output.

pub mod csv_sink;
pub mod storage;
pub mod vertex;
