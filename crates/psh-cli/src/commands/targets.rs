use crate::dispatch;
use crate::TargetArgs;
use psh_core::config::Config;

pub fn run(config: &Config, args: &TargetArgs, json: bool) -> anyhow::Result<()> {
    let targets = dispatch::resolve_targets(config, args)?;

    if json {
        let entries: Vec<serde_json::Value> = targets
            .values()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "ip": t.ip,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{:<22} {:<24} {}", "ID", "NAME", "IP");
        println!("{}", "-".repeat(60));
        for t in targets.values() {
            println!("{:<22} {:<24} {}", t.id, t.display_name(), t.ip);
        }
    }

    Ok(())
}
