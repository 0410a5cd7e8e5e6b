use scraper::{ElementRef, Html, Selector};

use crate::{error::AppError, models::NewArticle};

/// Title and href pulled from one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedLink {
    pub title: String,
    pub link: String,
}

impl From<ScrapedLink> for NewArticle {
    fn from(scraped: ScrapedLink) -> Self {
        Self {
            title: scraped.title,
            link: scraped.link,
        }
    }
}

/// Selects headings and reads the anchors directly under them.
pub struct Extractor {
    selector: Selector,
}

impl Extractor {
    pub fn new(heading_selector: &str) -> Result<Self, AppError> {
        let selector = Selector::parse(heading_selector).map_err(|e| {
            AppError::parse(format!("invalid selector '{heading_selector}': {e:?}"))
        })?;
        Ok(Self { selector })
    }

    /// Links of the matching headings, in document order.
    pub fn links<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ScrapedLink> + 'a {
        document.select(&self.selector).filter_map(link_from_heading)
    }

    pub fn extract(&self, html: &str) -> Vec<ScrapedLink> {
        let document = Html::parse_document(html);
        self.links(&document).collect()
    }
}

// Title is the text of every direct anchor, href comes from the first one.
fn link_from_heading(heading: ElementRef<'_>) -> Option<ScrapedLink> {
    let anchors: Vec<ElementRef<'_>> = heading
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .collect();

    let Some(link) = anchors.first().and_then(|a| a.value().attr("href")) else {
        tracing::debug!("skipping heading without a linked anchor");
        return None;
    };

    let title: String = anchors.iter().flat_map(|a| a.text()).collect();

    Some(ScrapedLink {
        title,
        link: link.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new("article h4").unwrap()
    }

    #[test]
    fn single_heading() {
        let links = extractor().extract(r#"<article><h4><a href="/x">T</a></h4></article>"#);

        assert_eq!(
            links,
            vec![ScrapedLink {
                title: "T".to_string(),
                link: "/x".to_string(),
            }]
        );
    }

    #[test]
    fn keeps_document_order() {
        let html = r#"
            <main>
              <article><h4><a href="/one">First</a></h4></article>
              <article>
                <h4><a href="/two">Second</a></h4>
                <h4><a href="/three"> Third </a></h4>
              </article>
            </main>"#;

        let links = extractor().extract(html);
        let titles: Vec<&str> = links.iter().map(|l| l.title.as_str()).collect();
        let hrefs: Vec<&str> = links.iter().map(|l| l.link.as_str()).collect();

        assert_eq!(titles, ["First", "Second", " Third "]);
        assert_eq!(hrefs, ["/one", "/two", "/three"]);
    }

    #[test]
    fn ignores_headings_outside_articles() {
        let html = r#"
            <h4><a href="/outside">Outside</a></h4>
            <section><h4><a href="/section">Section</a></h4></section>
            <article><h4><a href="/inside">Inside</a></h4></article>"#;

        let links = extractor().extract(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link, "/inside");
    }

    #[test]
    fn only_direct_anchor_children_count() {
        let html = r#"
            <article><h4><span><a href="/nested">Nested</a></span></h4></article>
            <article><h4>No link</h4></article>
            <article><h4><a>No href</a></h4></article>"#;

        assert!(extractor().extract(html).is_empty());
    }

    #[test]
    fn anchor_text_is_concatenated() {
        let html = r#"<article><h4><a href="/a">Big <b>news</b></a><a href="/b">!</a></h4></article>"#;

        let links = extractor().extract(html);
        assert_eq!(links[0].title, "Big news!");
        assert_eq!(links[0].link, "/a");
    }

    #[test]
    fn anchor_text_is_kept_verbatim() {
        let html = "<article><h4><a href=\"/ws\">\n  Padded  title \n</a></h4></article>";

        let links = extractor().extract(html);
        assert_eq!(links[0].title, "\n  Padded  title \n");
    }

    #[test]
    fn malformed_html_is_tolerated() {
        let links = extractor().extract(r#"<article><h4><a href="/x">Unclosed"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Unclosed");
    }

    #[test]
    fn invalid_selector_is_a_parse_error() {
        let err = Extractor::new("article h4[").err().unwrap();
        assert_eq!(err.name(), "ParseError");
    }

    #[test]
    fn scraped_link_becomes_article_fields() {
        let article = NewArticle::from(ScrapedLink {
            title: "T".to_string(),
            link: "/x".to_string(),
        });
        assert_eq!(article.title, "T");
        assert_eq!(article.link, "/x");
    }
}
