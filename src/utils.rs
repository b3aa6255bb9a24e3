use crate::ImageFormat;
use std::time::Duration;
use url::Url;

/// Replace characters that are not allowed in file names.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '&' | '=' | '#' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(|c: char| c == '_' || c.is_whitespace())
        .to_string()
}

/// Default output file for a capture of `url`, e.g. `example.com_docs.png`.
pub fn output_filename(url: &str, format: ImageFormat) -> String {
    let stem = match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            format!("{}{}", host, parsed.path())
        }
        Err(_) => url.to_string(),
    };

    let mut name = sanitize_filename(&stem);
    if name.is_empty() {
        name = "screenshot".to_string();
    }

    format!("{name}.{}", format.extension())
}

/// Short human readable duration for the CLI summary: `850ms`, `2.7s`, `1m 5s`.
pub fn format_duration(duration: Duration) -> String {
    match duration.as_secs() {
        0 => format!("{}ms", duration.as_millis()),
        secs @ 1..=59 => format!("{secs}.{}s", duration.subsec_millis() / 100),
        secs => format!("{}m {}s", secs / 60, secs % 60),
    }
}

/// Image size in binary units, e.g. `1.50 KB`.
pub fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;

    if value < KIB {
        format!("{bytes} B")
    } else if value < KIB * KIB {
        format!("{:.2} KB", value / KIB)
    } else if value < KIB * KIB * KIB {
        format!("{:.2} MB", value / (KIB * KIB))
    } else {
        format!("{:.2} GB", value / (KIB * KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("page.html"), "page.html");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("q?x=1&y=2"), "q_x_1_y_2");
        assert_eq!(sanitize_filename("/leading/"), "leading");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("https://example.com/", ImageFormat::Png),
            "example.com.png"
        );
        assert_eq!(
            output_filename("https://example.com/docs/intro?lang=en", ImageFormat::Jpeg),
            "example.com_docs_intro.jpg"
        );
        assert_eq!(
            output_filename("data:text/html,", ImageFormat::Webp),
            "text_html,.webp"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(2750)), "2.7s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59.0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
