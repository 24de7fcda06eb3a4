use anyhow::Result;
use redax_security::PatternCatalog;

pub fn handle(json: bool) -> Result<()> {
    let rules = PatternCatalog::builtin().list_rules();

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("Rules:");
    for rule in rules {
        println!("  {:<28} {}", rule.key, rule.label);
    }

    Ok(())
}
