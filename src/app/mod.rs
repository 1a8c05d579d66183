// Application layer: the YFinance portal, request builders and the export pipeline.

pub mod fan_out;
pub mod pipelines;
pub mod portal;
pub mod requests;
