//! `reconsole upload` — submit a backoffice/vendor file pair as a new
//! reconciliation batch. Parsing and matching happen server-side; the files
//! pass through opaquely.

use std::path::PathBuf;

use reconsole_api_client::ApiClient;

use crate::CliError;

pub fn cmd_upload(
    client: &ApiClient,
    backoffice: PathBuf,
    vendor: PathBuf,
    backoffice_template: i64,
    vendor_template: i64,
) -> Result<(), CliError> {
    // Validate inputs before any network traffic.
    for (label, path) in [("backoffice", &backoffice), ("vendor", &vendor)] {
        if !path.is_file() {
            return Err(CliError::args(format!(
                "{} file not found: {}",
                label,
                path.display()
            )));
        }
    }

    eprintln!(
        "uploading {} + {}...",
        backoffice.display(),
        vendor.display()
    );

    let batch_id = client
        .upload_batch(&backoffice, &vendor, backoffice_template, vendor_template)
        .map_err(CliError::api)?;

    eprintln!("created batch RB-{batch_id}");
    eprintln!("track it with: reconsole batch RB-{batch_id}");
    println!("RB-{batch_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn missing_input_is_a_usage_error_without_network() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/batches");
            then.status(201).json_body(serde_json::json!({"batchId": 1}));
        });

        let client = ApiClient::with_base_url("t".into(), server.base_url());
        let err = cmd_upload(
            &client,
            PathBuf::from("/no/such/ledger.csv"),
            PathBuf::from("/no/such/vendor.csv"),
            1,
            2,
        )
        .unwrap_err();

        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        mock.assert_calls(0);
    }

    #[test]
    fn upload_round_trip() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/batches");
            then.status(201).json_body(serde_json::json!({"batchId": 31}));
        });

        let dir = tempfile::tempdir().unwrap();
        let bo = dir.path().join("ledger.csv");
        let vn = dir.path().join("vendor.csv");
        std::fs::write(&bo, "id,amount\n").unwrap();
        std::fs::write(&vn, "ref,value\n").unwrap();

        let client = ApiClient::with_base_url("t".into(), server.base_url());
        cmd_upload(&client, bo, vn, 3, 4).unwrap();
    }
}
