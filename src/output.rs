use colored::*;
use serde_json::Value;

pub fn print_event(event_type: &str, data: &Value) {
    println!("\n{} event received", event_type.yellow().bold());

    match serde_json::to_string_pretty(data) {
        Ok(pretty) => {
            for line in pretty.lines() {
                println!("   {}", line.dimmed());
            }
        }
        Err(_) => println!("   {}", data.to_string().dimmed()),
    }
}
