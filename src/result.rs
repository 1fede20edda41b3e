use chrono::Local;
use serde::Serialize;

use crate::model::{Chemical, DiseaseTable};

/// Everything the result page shows for one analysed image.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub image_path: String,
    pub disease: String,
    pub scientific_name: String,
    pub confidence: f32,
    pub severity: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
    pub chemicals: Vec<Chemical>,
    pub timestamp: String,
}

pub fn resolve(table: &DiseaseTable, filename: &str, key: &str) -> ResultView {
    let record = table.resolve(key);
    ResultView {
        image_path: format!("uploads/{filename}"),
        disease: record.name.clone(),
        scientific_name: record.scientific_name.clone().unwrap_or_default(),
        confidence: record.confidence,
        severity: record.severity.clone(),
        description: record.description.clone(),
        symptoms: record.symptoms.clone(),
        treatment: record.treatment.clone(),
        prevention: record.prevention.clone(),
        chemicals: record.chemicals.clone(),
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
