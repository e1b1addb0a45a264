// Example: load the submission config and print the starter pipeline's ports
use plumb_libs::{default_pipeline, load_config, serialize, SubmissionConfig};

fn main() {
    let config_path = std::env::var("PLUMB_CONFIG").unwrap_or_else(|_| "plumb.yaml".to_string());

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Failed to load {}: {} (using defaults)", config_path, e);
            SubmissionConfig::default()
        }
    };

    println!("Endpoints (tried in order):");
    for endpoint in &config.endpoints {
        println!("  - {}", endpoint);
    }

    let store = match default_pipeline() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ Failed to build starter pipeline: {}", e);
            std::process::exit(1);
        }
    };

    for node in store.nodes() {
        println!("\n  {} ({})", node.id, node.kind.label());
        for port in node.ports() {
            println!("    {:?} {} [{}]", port.direction, port.id, port.label);
        }
    }

    match serialize(&store).to_json() {
        Ok(json) => println!("\n{}", json),
        Err(e) => eprintln!("✗ Failed to serialize: {}", e),
    }
}
