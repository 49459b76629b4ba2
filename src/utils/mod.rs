/// Split a `Key: Value` header line.
pub fn parse_header_line(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("empty header name".to_string());
    }
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(format!("header name '{key}' contains whitespace"));
    }
    Ok((key.to_string(), val.trim().to_string()))
}

pub fn parse_csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn parse_base_url(value: &str) -> Result<reqwest::Url, String> {
    let url = reqwest::Url::parse(value.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}', expected http or https")),
    }
}
