//! Server-rendered HTML pages

use maud::{html, Markup, DOCTYPE};

use crate::service::ClassifiedUpload;
use crate::utils::filename::ALLOWED_EXTENSIONS;

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                h1 { (title) }
                (content)
            }
        }
    }
}

/// Upload form, optionally with the last prediction or an error
pub fn index_page(result: Option<&ClassifiedUpload>, error: Option<&str>) -> Markup {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    layout(
        "Rice Leaf Disease Classifier",
        html! {
            form method="post" action="/" enctype="multipart/form-data" {
                input type="file" name="file" accept=(accept);
                button type="submit" { "Classify" }
            }
            @if let Some(error) = error {
                p.error { (error) }
            }
            @if let Some(result) = result {
                section.result {
                    img src=(result.upload.url) alt="Uploaded leaf" width="300";
                    p { "Prediction: " strong.prediction { (result.prediction.label) } }
                    p { "Confidence: " span.confidence { (format!("{:.2}", result.prediction.confidence)) } "%" }
                    p.timing { "Processed in " (result.inference_time_ms) " ms" }
                }
            }
        },
    )
}

/// Form posting to `/update_api_key`
pub fn update_api_key_page() -> Markup {
    layout(
        "Update API Key",
        html! {
            form method="post" action="/update_api_key" {
                label for="key_name" { "Key name" }
                input #key_name type="text" name="key_name" required;
                label for="key_value" { "New key value" }
                input #key_value type="text" name="key_value" required;
                button type="submit" { "Update" }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Prediction;
    use crate::service::SavedUpload;
    use std::path::PathBuf;

    #[test]
    fn test_index_page_with_result() {
        let result = ClassifiedUpload {
            upload: SavedUpload {
                file_name: "leaf.png".to_string(),
                extension: "png".to_string(),
                path: PathBuf::from("static/uploads/leaf.png"),
                url: "/static/uploads/leaf.png".to_string(),
            },
            prediction: Prediction {
                label: "blight".to_string(),
                confidence: 87.456,
            },
            inference_time_ms: 3,
        };

        let page = index_page(Some(&result), None).into_string();
        assert!(page.contains(r#"src="/static/uploads/leaf.png""#));
        assert!(page.contains("blight"));
        assert!(page.contains("87.46"));
        assert!(page.contains("Processed in 3 ms"));
        assert!(page.contains(r#"accept=".png,.jpg,.jpeg""#));
    }

    #[test]
    fn test_index_page_escapes_error() {
        let page = index_page(None, Some("<script>")).into_string();
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("class=\"result\""));
    }

    #[test]
    fn test_update_form() {
        let page = update_api_key_page().into_string();
        assert!(page.contains(r#"name="key_name""#));
        assert!(page.contains(r#"name="key_value""#));
    }
}
