/// Article file contents: a front-matter block with the title and
/// permalink, a blank line, then the converted body.
pub fn build_article_document(title: &str, slug: &str, body: &str) -> String {
    format!("---\ntitle: {title}\npermalink: /{slug}/\n---\n\n{body}")
}
