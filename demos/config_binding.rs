//! Example usage of record declaration, binding options and schema documents

use bindr::{
    bind, bind_with, record, BindOptions, FixSuggestion, RecordShape, SchemaRegistry, TypeExpr,
};
use serde_json::json;

record! {
    #[derive(Debug)]
    pub struct S3Config {
        pub default_bucket: String,
        pub default_region: String,
        pub max_item_size: u64,
    }
}

record! {
    #[derive(Debug)]
    pub struct ServiceConfig {
        pub api_key: String,
        pub timeout_ms: u32,
        pub s3_settings: S3Config,
        pub support_emails: Vec<String>,
        pub backup_db_hostname: Option<String>,
        pub no_reply_email: String = "no-reply@python.org".to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========================================
    // Typed records
    // ========================================

    println!("=== record! Demo ===\n");

    let input = json!({
        "api-key": "abcd",
        "timeout ms": "3875",
        "s3_settings": {
            "default_bucket": "company-bucket",
            "default_region": "us-east-1",
            "max_item_size": 2048
        },
        "support_emails": ["ops@example.com"],
        "backup_db_hostname": null
    });

    let config: ServiceConfig = bind(&input)?;
    println!("Bound config: {:#?}", config);

    // Errors point at the failing element
    let mut broken = input.clone();
    broken["s3_settings"]["max_item_size"] = json!("large");
    if let Err(e) = bind::<ServiceConfig>(&broken) {
        println!("\nRejected: {}", e);
        if let Some(fix) = e.fix_suggestion() {
            println!("  Fix: {}", fix);
        }
    }

    // ========================================
    // Binding options
    // ========================================

    println!("\n=== BindOptions Demo ===\n");

    let mut extra = input.clone();
    extra["legacy-flag"] = json!(true);

    if let Err(e) = bind::<ServiceConfig>(&extra) {
        println!("Strict: {}", e);
    }
    let lenient: ServiceConfig = bind_with(&extra, &BindOptions::lenient())?;
    println!("Lenient: bound {} with unknown key skipped", lenient.api_key);

    // ========================================
    // Shapes by hand and from documents
    // ========================================

    println!("\n=== Dynamic Shapes Demo ===\n");

    let shape = RecordShape::builder("Retry")
        .field("attempts", TypeExpr::int())
        .field("backoff_ms", TypeExpr::list_of(TypeExpr::int()))
        .build();
    let retry = bindr::bind_record(
        &shape,
        &json!({"attempts": "3", "backoff-ms": [100, "200", 400.0]}),
        &BindOptions::default(),
    )?;
    println!("Builder shape: {}", retry.to_json());

    let schema = SchemaRegistry::from_yaml_str(
        r#"
root: Retry
records:
  Retry:
    attempts: int
    backoff_ms: { type: "List[int]", default: [100, 200] }
"#,
    )?;
    let record = schema.bind("Retry", &json!({"attempts": 5}), &BindOptions::default())?;
    println!("Schema shape: {}", record.to_json());

    Ok(())
}
