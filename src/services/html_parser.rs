// src/services/html_parser.rs

//! `PageParser` implementation over HTML using configurable CSS selectors.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Comment, PageSelectors};
use crate::services::parser::{
    Field, ListingPage, PageParser, RecordPage, TitledLink, VoteCount,
};
use crate::utils::normalize_whitespace;

/// Parses search, listing and discussion pages.
#[derive(Debug, Clone)]
pub struct HtmlPageParser {
    selectors: PageSelectors,
}

impl HtmlPageParser {
    /// Create a parser, rejecting selectors that do not compile.
    pub fn new(selectors: PageSelectors) -> Result<Self> {
        for (_, selector) in selectors.all() {
            Self::parse_selector(selector)?;
        }
        Ok(Self { selectors })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    fn text_of(element: ElementRef<'_>) -> String {
        normalize_whitespace(&element.text().collect::<String>())
    }

    fn page_count(&self, document: &Html) -> Result<Option<u32>> {
        let indicator_sel = Self::parse_selector(&self.selectors.page_indicator)?;
        let strong_sel = Self::parse_selector("strong")?;

        let Some(indicator) = document.select(&indicator_sel).next() else {
            return Ok(None);
        };
        // "Page <strong>1</strong> of <strong>N</strong>"
        let total = indicator
            .select(&strong_sel)
            .nth(1)
            .map(Self::text_of)
            .ok_or_else(|| AppError::structure_changed("page indicator has no page count"))?;
        total
            .parse()
            .map(Some)
            .map_err(|_| AppError::structure_changed(format!("page count '{total}' is not a number")))
    }

    fn votes(&self, document: &Html) -> Result<Field<Vec<VoteCount>>> {
        let tally_sel = Self::parse_selector(&self.selectors.vote_tally)?;
        let Some(script) = document.select(&tally_sel).next() else {
            return Ok(Field::Missing);
        };
        let raw: String = script.text().collect();
        if raw.trim().is_empty() {
            return Ok(Field::Missing);
        }
        Ok(match serde_json::from_str(raw.trim()) {
            Ok(votes) => Field::Present(votes),
            Err(e) => Field::Failed(format!("vote tally: {e}")),
        })
    }

    fn comments(&self, document: &Html) -> Result<Field<Vec<Comment>>> {
        let comment_sel = Self::parse_selector(&self.selectors.comment)?;
        let content_sel = Self::parse_selector(&self.selectors.comment_content)?;
        let selected_sel = Self::parse_selector(&self.selectors.comment_selected)?;
        let reply_sel = Self::parse_selector(&self.selectors.comment_reply)?;

        let content = |el: ElementRef<'_>| {
            el.select(&content_sel)
                .next()
                .map(|c| c.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };

        let comments = document
            .select(&comment_sel)
            .map(|comment| Comment {
                text: content(comment),
                selected_option: comment
                    .select(&selected_sel)
                    .next()
                    .map(Self::text_of)
                    .filter(|s| !s.is_empty()),
                replies: comment.select(&reply_sel).map(content).collect(),
            })
            .collect();
        Ok(Field::Present(comments))
    }
}

impl PageParser for HtmlPageParser {
    fn parse_search(&self, html: &str) -> Result<Vec<TitledLink>> {
        let document = Html::parse_document(html);
        let result_sel = Self::parse_selector(&self.selectors.search_result)?;

        Ok(document
            .select(&result_sel)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                Some(TitledLink {
                    title: Self::text_of(a),
                    href: href.to_string(),
                })
            })
            .collect())
    }

    fn parse_listing(&self, html: &str) -> Result<ListingPage> {
        let document = Html::parse_document(html);
        let title_sel = Self::parse_selector(&self.selectors.listing_title)?;
        let anchor_sel = Self::parse_selector("a[href]")?;

        let links = document
            .select(&title_sel)
            .filter_map(|container| {
                let anchor = container.select(&anchor_sel).next()?;
                Some(TitledLink {
                    title: Self::text_of(container),
                    href: anchor.value().attr("href")?.to_string(),
                })
            })
            .collect();

        Ok(ListingPage {
            total_pages: self.page_count(&document)?,
            links,
        })
    }

    fn parse_record(&self, html: &str) -> Result<RecordPage> {
        let document = Html::parse_document(html);
        let container_sel = Self::parse_selector(&self.selectors.question_container)?;
        if document.select(&container_sel).next().is_none() {
            return Err(AppError::structure_changed(format!(
                "'{}' not found on question page",
                self.selectors.question_container
            )));
        }

        let body_sel = Self::parse_selector(&self.selectors.question_body)?;
        let choice_sel = Self::parse_selector(&self.selectors.choices)?;
        let suggested_sel = Self::parse_selector(&self.selectors.suggested_answer)?;
        let image_sel = Self::parse_selector(&self.selectors.image)?;

        let body = document
            .select(&body_sel)
            .next()
            .map(|p| p.inner_html().trim().to_string())
            .into();

        let options: Vec<String> = document.select(&choice_sel).map(Self::text_of).collect();
        let options = if options.is_empty() {
            Field::Missing
        } else {
            Field::Present(options)
        };

        let suggested_answer = document
            .select(&suggested_sel)
            .next()
            .map(Self::text_of)
            .filter(|s| !s.is_empty())
            .into();

        let image_refs = Field::Present(
            document
                .select(&image_sel)
                .filter_map(|img| img.value().attr("src"))
                .map(str::to_string)
                .collect(),
        );

        Ok(RecordPage {
            body,
            options,
            votes: self.votes(&document)?,
            suggested_answer,
            comments: self.comments(&document)?,
            image_refs,
        })
    }
}
