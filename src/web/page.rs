//! Server-side HTML for the login form and the upload/result page.

use crate::auth::REJECTED_MESSAGE;
use crate::languages::LanguageCatalog;
use crate::transcription::{TranscriberOptions, TranscriptionResult};

/// Everything the main page shows.
pub struct PageView<'a> {
    pub options: &'a TranscriberOptions,
    pub catalog: &'a LanguageCatalog,
    pub result: Option<&'a TranscriptionResult>,
    pub error: Option<&'a str>,
    /// Language pre-selected in the select box
    pub selected_language: &'a str,
    pub language_known: bool,
}

/// Escapes text for use in element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 72rem; padding: 0 1rem; color: #222; }
h1 { margin-bottom: 0; }
.subtitle { margin-top: .25rem; color: #555; }
.panel { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; border: 1px solid #ddd; border-radius: 8px; padding: 1.5rem; }
.error { background: #fdecea; color: #8a1c13; border-radius: 4px; padding: .75rem 1rem; }
pre#transcription { white-space: pre-wrap; background: #f6f8fa; padding: 1rem; border-radius: 4px; }
footer { margin-top: 2rem; font-size: .8rem; color: #888; }
label { display: block; margin: .5rem 0; }
"#;

const PREVIEW_SCRIPT: &str = r#"
document.getElementById('audio').addEventListener('change', function (e) {
  var player = document.getElementById('preview');
  var file = e.target.files[0];
  if (file) { player.src = URL.createObjectURL(file); player.hidden = false; }
  else { player.hidden = true; }
});
document.getElementById('language_known').addEventListener('change', function (e) {
  document.getElementById('language_row').hidden = !e.target.checked;
});
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Username/password form, with the rejection message after a failed attempt.
pub fn render_login(rejected: bool) -> String {
    let mut body = String::from(
        "<h1>Transcribe</h1>\n<form method=\"post\" action=\"/login\">\n\
         <label>Username <input type=\"text\" name=\"username\" autocomplete=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\" required></label>\n\
         <button type=\"submit\">Log in</button>\n</form>\n",
    );
    if rejected {
        body.push_str(&format!(
            "<p class=\"error\" id=\"login-error\">{}</p>\n",
            escape_html(REJECTED_MESSAGE)
        ));
    }
    layout("Transcribe - Login", &body)
}

/// Upload section, transcribe section and, when present, the stored result.
pub fn render_main(view: &PageView<'_>) -> String {
    let options = view.options;
    let mut body = String::new();

    body.push_str("<header>\n<h1>Transcribe</h1>\n");
    body.push_str("<p class=\"subtitle\">An Audio-To-Text Transcription Application</p>\n</header>\n");

    if let Some(error) = view.error {
        body.push_str(&format!("<p class=\"error\" id=\"error\">{}</p>\n", escape_html(error)));
    }

    body.push_str("<form class=\"panel\" method=\"post\" action=\"/transcribe\" enctype=\"multipart/form-data\">\n");

    // 1. Upload
    body.push_str("<section id=\"upload\">\n<h2>1. Upload file</h2>\n");
    body.push_str(&format!(
        "<label><input type=\"checkbox\" id=\"language_known\" name=\"language_known\"{}> Origin language known</label>\n",
        if view.language_known { " checked" } else { "" }
    ));
    body.push_str(&format!(
        "<p id=\"language_row\"{}><label>Choose origin language <select name=\"language\">\n",
        if view.language_known { "" } else { " hidden" }
    ));
    let selected_index = view.catalog.position(view.selected_language);
    for (index, code) in view.catalog.codes().iter().enumerate() {
        let selected = if selected_index == Some(index) { " selected" } else { "" };
        body.push_str(&format!("<option value=\"{code}\"{selected}>{code}</option>\n"));
    }
    body.push_str("</select></label></p>\n");
    body.push_str(&format!(
        "<label>Upload audio file <input type=\"file\" id=\"audio\" name=\"audio\" accept=\"{}\"></label>\n",
        escape_html(&options.accept_attribute())
    ));
    body.push_str("<audio id=\"preview\" controls hidden></audio>\n</section>\n");

    // 2. Transcribe
    let action = if options.translate_to_english {
        "Translate to English"
    } else {
        "Transcribe Original"
    };
    body.push_str(&format!(
        "<section id=\"transcribe\">\n<h2>2. {action}</h2>\n<button type=\"submit\">{action}</button>\n</section>\n"
    ));
    body.push_str("</form>\n");

    if let Some(result) = view.result {
        body.push_str("<section id=\"result\">\n<h2>Result</h2>\n");
        body.push_str(&format!(
            "<pre id=\"transcription\">{}</pre>\n",
            escape_html(&result.transcription)
        ));
        if let Some(translation) = &result.translation {
            body.push_str(&format!(
                "<h3>English translation</h3>\n<pre id=\"translation\">{}</pre>\n",
                escape_html(translation)
            ));
        }
        if let Some(language) = &result.detected_language {
            body.push_str(&format!(
                "<p id=\"detected-language\">Detected language: {}</p>\n",
                escape_html(language)
            ));
        }
        body.push_str("<p><a id=\"download\" href=\"/download\">Download transcription</a></p>\n");
        body.push_str("<form method=\"post\" action=\"/clear\"><button type=\"submit\">Clear</button></form>\n");
        body.push_str("</section>\n");
    }

    body.push_str(&format!(
        "<footer>Model {} ({})</footer>\n",
        escape_html(&options.model_version.short()),
        options.whisper_model.id()
    ));
    body.push_str(&format!("<script>{PREVIEW_SCRIPT}</script>\n"));

    layout("Transcribe", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::Preset;

    fn view<'a>(
        options: &'a TranscriberOptions,
        catalog: &'a LanguageCatalog,
        result: Option<&'a TranscriptionResult>,
    ) -> PageView<'a> {
        PageView {
            options,
            catalog,
            result,
            error: None,
            selected_language: &options.default_language,
            language_known: false,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_main_page_preselects_default_language() {
        let options = TranscriberOptions::preset(Preset::Translate);
        let catalog = LanguageCatalog::whisper();
        let html = render_main(&view(&options, &catalog, None));

        assert!(html.contains("<option value=\"de\" selected>de</option>"));
        assert_eq!(html.matches(" selected>").count(), 1);
        assert!(html.contains("accept=\".mp3,.mp4,.ogg,.wav\""));
        assert!(html.contains("Translate to English"));
        assert!(!html.contains("id=\"transcription\""));
    }

    #[test]
    fn test_result_is_escaped() {
        let options = TranscriberOptions::preset(Preset::Transcribe);
        let catalog = LanguageCatalog::whisper();
        let result = TranscriptionResult::new("<script>alert(1)</script>");
        let html = render_main(&view(&options, &catalog, Some(&result)));

        assert!(html.contains(
            "<pre id=\"transcription\">&lt;script&gt;alert(1)&lt;/script&gt;</pre>"
        ));
        assert!(html.contains("Transcribe Original"));
        assert!(html.contains("href=\"/download\""));
    }

    #[test]
    fn test_echoed_language_is_selected() {
        let options = TranscriberOptions::preset(Preset::Translate);
        let catalog = LanguageCatalog::whisper();
        let mut page = view(&options, &catalog, None);
        page.selected_language = "fr";
        page.language_known = true;
        let html = render_main(&page);

        assert!(html.contains("<option value=\"fr\" selected>fr</option>"));
        assert!(html.contains("<option value=\"de\">de</option>"));
        assert!(html.contains("name=\"language_known\" checked>"));
        assert!(!html.contains("id=\"language_row\" hidden"));
    }

    #[test]
    fn test_login_error_only_after_rejection() {
        assert!(!render_login(false).contains("login-error"));
        assert!(render_login(true).contains(REJECTED_MESSAGE));
    }
}
