use insight_desk::workflows::editorial::content::escape_html;
use insight_desk::workflows::editorial::drafts::DraftInspection;
use std::fmt::Write as _;

const PREVIEW_STYLE: &str = r#"    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.7; color: #333; max-width: 900px; margin: 0 auto; padding: 40px 20px; background: #F8F4EE; }
    .container { background: white; padding: 40px; border-radius: 4px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }
    h1 { color: #E8722A; margin-bottom: 10px; font-size: 2.5rem; }
    .meta { color: #666; font-size: 14px; margin-bottom: 30px; padding-bottom: 20px; border-bottom: 1px solid #ddd; }
    .meta span + span { margin-left: 15px; }
    .status { display: inline-block; padding: 4px 12px; background: #f0f0f0; border-radius: 4px; font-size: 12px; text-transform: uppercase; }
    .status.pending_review { background: #fff3cd; color: #856404; }
    .summary { font-size: 18px; color: #666; margin-bottom: 30px; font-style: italic; }
    .unresolved { background: #fff3cd; padding: 16px 20px; margin-bottom: 30px; border-radius: 4px; }
    .images { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; }
"#;

/// Standalone HTML page for reviewing a draft in a browser. Content is the editor's HTML
/// and is embedded as-is; every other value is escaped.
pub(crate) fn render_preview(inspection: &DraftInspection) -> String {
    let draft = &inspection.draft;
    let title = escape_html(draft.title());
    let status = draft.status().label();
    let mut html = String::new();

    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>Draft Preview - {title}</title>\n  <style>\n{PREVIEW_STYLE}  </style>\n</head>"
    );
    let _ = writeln!(html, "<body>\n  <div class=\"container\">\n    <h1>{title}</h1>");
    let _ = writeln!(
        html,
        "    <div class=\"meta\"><span class=\"status {status}\">{status}</span><span>Category: {}</span><span>Author: {}</span><span>Created: {}</span></div>",
        escape_html(draft.category()),
        escape_html(draft.author().unwrap_or("Not specified")),
        draft.created_at().format("%Y-%m-%d")
    );
    let _ = writeln!(
        html,
        "    <div class=\"summary\">{}</div>",
        escape_html(draft.summary())
    );

    if !inspection.report.is_clear() {
        let _ = writeln!(
            html,
            "    <div class=\"unresolved\"><strong>{} unresolved placeholder(s)</strong><ul>",
            inspection.report.count()
        );
        for marker in inspection.report.markers() {
            let _ = writeln!(html, "      <li>{}</li>", escape_html(&marker.to_string()));
        }
        html.push_str("    </ul></div>\n");
    }

    let _ = writeln!(html, "    <div>\n{}\n    </div>", draft.content());

    if !draft.images().is_empty() {
        html.push_str("    <div class=\"images\">\n      <h3>Images</h3>\n      <ul>\n");
        for image in draft.images() {
            let _ = writeln!(html, "        <li>{}</li>", escape_html(image));
        }
        html.push_str("      </ul>\n    </div>\n");
    }

    html.push_str("  </div>\n</body>\n</html>\n");
    html
}
