//! robots.txt and sitemap.xml bodies for the site.

use url::Url;

/// Sections that get their own sitemap entry. `""` is the landing page.
pub const DEFAULT_PAGES: &[&str] = &["", "#play-fiddlebops", "#features", "#faq"];

pub fn robots_txt(site_url: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(site_url)?;
    let sitemap = base.join("sitemap.xml")?;
    Ok(format!(
        "User-agent: *\nAllow: /\n\n# Sitemap\nSitemap: {sitemap}\n\n# Host\nHost: {site_url}"
    ))
}

/// One `<url>` per page, each resolved against `site_url`. The landing page
/// gets priority 1.0, everything else 0.7.
pub fn sitemap_xml(site_url: &str, pages: &[&str], lastmod: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(site_url)?;
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in pages {
        let loc = base.join(page)?;
        let priority = if page.is_empty() { "1.0" } else { "0.7" };
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <changefreq>weekly</changefreq>\n    <priority>{priority}</priority>\n  </url>\n",
            escape_xml(loc.as_str())
        ));
    }
    xml.push_str("</urlset>\n");
    Ok(xml)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
