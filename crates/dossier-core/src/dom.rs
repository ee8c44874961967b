//! Read-only queries over a rendered HTML snapshot.

use scraper::{ElementRef, Html, Selector};

use crate::error::AppError;

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::ConfigError(format!("Invalid selector '{css}': {e:?}")))
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Split every element matching `row_selector` into newline-separated tokens.
///
/// Token positions are preserved exactly, including blank tokens, since the
/// leading blanks identify what kind of row it is.
pub fn rows_from_html(html: &str, row_selector: &str) -> Result<Vec<Vec<String>>, AppError> {
    let sel = selector(row_selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&sel)
        .map(|el| text_content(el).split('\n').map(str::to_string).collect())
        .collect())
}

/// Trimmed text of every element matching `css`, in document order.
pub fn select_texts(html: &str, css: &str) -> Result<Vec<String>, AppError> {
    let sel = selector(css)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&sel)
        .map(|el| text_content(el).trim().to_string())
        .collect())
}

/// First non-empty trimmed text matching `css`.
pub fn select_first_text(html: &str, css: &str) -> Result<Option<String>, AppError> {
    Ok(select_texts(html, css)?
        .into_iter()
        .find(|text| !text.is_empty()))
}

/// Value of `attr` on every element matching `css` that carries it.
pub fn select_attrs(html: &str, css: &str, attr: &str) -> Result<Vec<String>, AppError> {
    let sel = selector(css)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&sel)
        .filter_map(|el| el.value().attr(attr).map(str::to_string))
        .collect())
}
