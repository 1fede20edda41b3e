use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::upload::UploadedImage;

pub const HEALTHY: &str = "healthy";
pub const BLACK_POD: &str = "black_pod";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chemical {
    pub name: String,
    pub dosage: String,
    pub application: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseRecord {
    pub key: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub confidence: f32,
    pub severity: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
    pub chemicals: Vec<Chemical>,
}

/// Read-only lookup from classification key to record.
///
/// Lookups never fail: unknown keys resolve to the fallback record the
/// table was built with.
#[derive(Debug, Clone)]
pub struct DiseaseTable {
    records: HashMap<String, DiseaseRecord>,
    fallback: DiseaseRecord,
}

impl DiseaseTable {
    pub fn new(fallback: DiseaseRecord, others: impl IntoIterator<Item = DiseaseRecord>) -> Self {
        let mut records: HashMap<String, DiseaseRecord> = others
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect();
        records.insert(fallback.key.clone(), fallback.clone());
        DiseaseTable { records, fallback }
    }

    pub fn builtin() -> Self {
        DiseaseTable::new(healthy(), [black_pod()])
    }

    pub fn resolve(&self, key: &str) -> &DiseaseRecord {
        self.records.get(key).unwrap_or(&self.fallback)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn chemical(name: &str, dosage: &str, application: &str) -> Chemical {
    Chemical {
        name: name.into(),
        dosage: dosage.into(),
        application: application.into(),
    }
}

fn black_pod() -> DiseaseRecord {
    DiseaseRecord {
        key: BLACK_POD.into(),
        name: "Black Pod Disease".into(),
        scientific_name: Some("Phytophthora megakarya".into()),
        confidence: 92.5,
        severity: "High".into(),
        description: "Black pod disease is the most damaging disease of cocoa worldwide, \
                      causing losses of 20-30% annually and up to 100% in severe cases."
            .into(),
        symptoms: strings(&[
            "Dark brown to black lesions on pods",
            "Rapid spread during wet seasons",
            "Premature pod drop",
            "White fungal growth on infected areas",
            "Internal bean rot",
        ]),
        treatment: strings(&[
            "Apply fungicides: Ridomil, Kocide, or copper-based fungicides",
            "Remove and destroy infected pods immediately",
            "Improve farm sanitation and drainage",
            "Prune trees to improve air circulation",
            "Harvest ripe pods frequently (weekly during wet season)",
        ]),
        prevention: strings(&[
            "Plant resistant cocoa varieties",
            "Maintain proper spacing between trees",
            "Regular farm sanitation",
            "Apply fungicides preventively during rainy season",
            "Ensure good drainage in cocoa farms",
        ]),
        chemicals: vec![
            chemical(
                "Ridomil Gold",
                "2.5kg per hectare",
                "Spray every 2-3 weeks during rainy season",
            ),
            chemical("Kocide 2000", "3kg per hectare", "Apply as protective spray"),
            chemical("Nordox 75 WG", "2kg per hectare", "Preventive application"),
        ],
    }
}

fn healthy() -> DiseaseRecord {
    DiseaseRecord {
        key: HEALTHY.into(),
        name: "Healthy Cocoa".into(),
        scientific_name: None,
        confidence: 95.0,
        severity: "None".into(),
        description: "Your cocoa plant appears healthy with no visible signs of disease.".into(),
        symptoms: Vec::new(),
        treatment: Vec::new(),
        prevention: strings(&[
            "Continue regular farm maintenance",
            "Monitor plants weekly for early disease detection",
            "Maintain proper nutrition and watering",
            "Keep farm clean and well-drained",
        ]),
        chemicals: Vec::new(),
    }
}

/// Picks a classification key for a stored image.
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &UploadedImage) -> String;
}

/// Stand-in for a real model: ignores the image and draws uniformly from a fixed key set.
pub struct RandomClassifier {
    keys: Vec<String>,
}

impl RandomClassifier {
    pub fn new(keys: Vec<String>) -> Self {
        RandomClassifier { keys }
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        RandomClassifier::new(vec![BLACK_POD.into(), HEALTHY.into()])
    }
}

impl Classifier for RandomClassifier {
    fn classify(&self, _image: &UploadedImage) -> String {
        self.keys
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| HEALTHY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn image() -> UploadedImage {
        UploadedImage {
            original_name: "leaf.png".into(),
            stored_name: "20240115_120000_leaf.png".into(),
            path: PathBuf::from("uploads/20240115_120000_leaf.png"),
            size: 4,
            extension: "png".into(),
        }
    }

    #[test]
    fn builtin_table_has_both_records() {
        let table = DiseaseTable::builtin();
        assert_eq!(table.resolve(BLACK_POD).key, BLACK_POD);
        assert_eq!(table.resolve(HEALTHY).key, HEALTHY);
        assert_eq!(table.resolve(BLACK_POD).name, "Black Pod Disease");
        assert_eq!(table.resolve(BLACK_POD).chemicals.len(), 3);
    }

    #[test]
    fn unknown_key_falls_back_to_healthy() {
        let table = DiseaseTable::builtin();
        let record = table.resolve("unknown_key");
        assert_eq!(record.key, HEALTHY);
        assert_eq!(record.name, "Healthy Cocoa");
        assert!(record.scientific_name.is_none());
    }

    #[test]
    fn random_classifier_stays_within_its_keys() {
        let classifier = RandomClassifier::default();
        let table = DiseaseTable::builtin();
        let image = image();
        for _ in 0..64 {
            let key = classifier.classify(&image);
            assert!(key == BLACK_POD || key == HEALTHY, "unexpected key {key}");
            assert_eq!(table.resolve(&key).key, key);
        }
    }

    #[test]
    fn empty_classifier_defaults_to_healthy() {
        let classifier = RandomClassifier::new(Vec::new());
        assert_eq!(classifier.classify(&image()), HEALTHY);
    }
}
