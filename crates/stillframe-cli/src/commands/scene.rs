//! Scene command

use std::fs;
use stillframe_core::SceneDescription;

pub fn run(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&SceneDescription::cone_demo())?;

    match output {
        Some(path) => {
            fs::write(path, &json)?;
            println!("Scene JSON written to {}", path);
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
