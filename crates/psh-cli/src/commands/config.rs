use psh_core::config::Config;

const SAMPLE_CONFIG: &str = r#"# psh configuration. Every key is optional; flags override these values.

user: ec2-user
private_key: ~/.ssh/id_rsa
port: 22
ip_type: private          # public | private
# inventory: ~/.config/psh/inventory.yaml
audit_log: ~/.psh_history
host_key_check: false     # true checks ~/.ssh/known_hosts
"#;

const SAMPLE_INVENTORY: &str = r#"# Hosts psh can target. Only running instances are selected.

instances:
  - id: i-0123456789abcdef0
    state: running
    private_ip: 10.0.1.10
    public_ip: 203.0.113.10
    tags:
      Name: web-1
      env: prod

  - id: i-0fedcba9876543210
    state: running
    private_ip: 10.0.1.11
    tags:
      Name: web-2
      env: prod
"#;

fn write_if_missing(path: &std::path::Path, contents: &str) -> anyhow::Result<()> {
    if path.exists() {
        println!("Already exists: {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    println!("Sample written to: {}", path.display());
    Ok(())
}

pub fn run(path: bool, init: bool) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        write_if_missing(&config_path, SAMPLE_CONFIG)?;
        write_if_missing(&Config::default().inventory_path(), SAMPLE_INVENTORY)?;
        return Ok(());
    }

    println!("Config path: {}", config_path.display());
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        println!("Status:      not found (using defaults)");
        println!("Run `psh config --init` to create one.");
        Config::default()
    };

    println!("User:        {}", config.user);
    println!("Private key: {}", config.private_key);
    println!("Port:        {}", config.port);
    println!("IP type:     {}", config.ip_type);
    println!("Inventory:   {}", config.inventory_path().display());
    println!("Audit log:   {}", config.audit_log_path().display());
    println!("Host keys:   {}", if config.host_key_check { "known_hosts" } else { "not verified" });

    Ok(())
}
