use std::fmt::Write as _;

use super::ReviewNotice;
use crate::workflows::editorial::content::escape_html;

pub fn subject(notice: &ReviewNotice) -> String {
    format!("New Insights Article Ready for Review: {}", notice.title)
}

pub fn html_body(notice: &ReviewNotice) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>");
    html.push_str("<div style=\"max-width:600px;margin:0 auto;padding:20px;font-family:sans-serif\">");
    html.push_str("<h1>New Article Ready for Review</h1>");
    html.push_str("<p>A new insights article is ready for your review:</p><ul>");
    let _ = writeln!(html, "<li><strong>Title:</strong> {}</li>", escape_html(&notice.title));
    let _ = writeln!(
        html,
        "<li><strong>Slug:</strong> {}</li>",
        escape_html(notice.slug.as_str())
    );
    let _ = writeln!(
        html,
        "<li><strong>Category:</strong> {}</li>",
        escape_html(&notice.category)
    );
    if let Some(author) = &notice.author {
        let _ = writeln!(html, "<li><strong>Author:</strong> {}</li>", escape_html(author));
    }
    html.push_str("</ul>");
    let url = escape_html(&notice.review_url);
    let _ = writeln!(html, "<p><a href=\"{url}\">{url}</a></p>");
    let _ = writeln!(
        html,
        "<p>Local preview: <code>insight-desk preview {}</code></p>",
        escape_html(notice.slug.as_str())
    );
    html.push_str("</div></body></html>");
    html
}

pub fn text_body(notice: &ReviewNotice) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "New Insights Article Ready for Review");
    let _ = writeln!(text);
    let _ = writeln!(text, "Title: {}", notice.title);
    let _ = writeln!(text, "Slug: {}", notice.slug);
    let _ = writeln!(text, "Category: {}", notice.category);
    if let Some(author) = &notice.author {
        let _ = writeln!(text, "Author: {author}");
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "Review: {}", notice.review_url);
    let _ = write!(text, "Local preview: insight-desk preview {}", notice.slug);
    text
}
