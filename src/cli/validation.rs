use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive number of seconds".to_string());
        }
    }
    if let Some(raw) = args.url.as_deref() {
        crate::utils::parse_base_url(raw).map_err(|e| format!("invalid --url '{raw}': {e}"))?;
    }
    for raw in args.header.iter() {
        crate::utils::parse_header_line(raw)
            .map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.columns.as_deref() {
        crate::subscriber::select_columns(&crate::utils::parse_csv_list(raw))
            .map_err(|e| format!("invalid --columns '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or html"
            ));
        }
    }
    Ok(())
}
