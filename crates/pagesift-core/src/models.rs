/// The sole output of a pipeline run: the extracted field mapping plus the
/// context it was produced in. Nothing is persisted; the caller prints it
/// and the run is over.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExtractionResult {
    pub url: String,
    pub model: String,
    /// JSON object mapping each schema field to its extracted value
    /// (`null` where the model found no match).
    pub data: serde_json::Value,
}
