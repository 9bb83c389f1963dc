//! Build script: validates default-settings.json at compile time.

use std::path::PathBuf;

fn main() {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR set by Cargo");
    let settings_path: PathBuf = [&manifest_dir, "config", "default-settings.json"]
        .iter()
        .collect();
    println!("cargo:rerun-if-changed={}", settings_path.display());
    let json = std::fs::read_to_string(&settings_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read {}: {}. default-settings.json must exist and be valid.",
            settings_path.display(),
            e
        )
    });

    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct CategoryEntry {
        id: String,
        name: String,
    }
    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct PlanEntry {
        id: String,
        name: String,
        message_limit: u32,
    }
    #[derive(serde::Deserialize)]
    struct SettingsEntry {
        categories: Vec<CategoryEntry>,
        plans: Vec<PlanEntry>,
    }

    let settings: SettingsEntry = serde_json::from_str(&json).unwrap_or_else(|e| {
        panic!(
            "default-settings.json is invalid JSON: {}. Fix the file and rebuild.",
            e
        )
    });
    if settings.categories.is_empty() {
        panic!("default-settings.json must define at least one category");
    }
    if !settings.plans.iter().any(|p| p.id == "free") {
        panic!("default-settings.json must define a \"free\" plan");
    }
}
