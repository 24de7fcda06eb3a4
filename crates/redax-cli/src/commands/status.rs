use anyhow::Result;
use redax_config::Config;
use redax_engine::BatchProcessor;

pub async fn handle(config: &Config, json: bool) -> Result<()> {
    let processor = BatchProcessor::from_config(config).await;
    let status = processor.status();

    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    } else if status.ready {
        println!("✓ {}", status.message);
        if let Some(program) = &status.program {
            println!("  Program: {}", program.display());
        }
        if let Some(version) = &status.version {
            println!("  Version: {}", version);
        }
        println!("  Staging: {}", processor.staging().root().display());
    } else {
        println!("✗ {}", status.message);
    }

    anyhow::ensure!(status.ready, "converter unavailable");
    Ok(())
}
