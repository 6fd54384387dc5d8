//! efetch XML parser using quick-xml

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{CheckError, Result};
use crate::models::EvidenceRecord;

/// Parse a `PubmedArticleSet` document into records, in document order.
///
/// Articles without a PMID are skipped. Inline markup in titles and abstracts
/// is flattened to its text.
pub fn parse_article_set(xml: &str) -> Result<Vec<EvidenceRecord>> {
    let mut reader = Reader::from_str(xml);

    let mut records = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut article: Option<ArticleBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                if name == "PubmedArticle" {
                    article = Some(ArticleBuilder::default());
                }
                if let Some(builder) = article.as_mut() {
                    builder.open(&name, &e, &stack);
                }
                stack.push(name);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.pop();
                if name == "PubmedArticle" {
                    if let Some(record) = article.take().and_then(ArticleBuilder::finish) {
                        records.push(record);
                    }
                } else if let Some(builder) = article.as_mut() {
                    builder.close(&name);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(builder) = article.as_mut() {
                    builder.text(&stack, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(builder) = article.as_mut() {
                    builder.text(&stack, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(builder) = article.as_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if let Some(resolved) = resolve_entity(&entity) {
                        builder.text(&stack, &resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CheckError::Xml(format!(
                    "Error parsing efetch response at position {}: {e}",
                    reader.error_position()
                )))
            }
            _ => {}
        }
    }

    Ok(records)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn resolve_entity(name: &str) -> Option<String> {
    let resolved = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(resolved.to_string())
}

fn parent_is(stack: &[String], name: &str) -> bool {
    stack.last().map(String::as_str) == Some(name)
}

fn within(stack: &[String], name: &str) -> bool {
    stack.iter().any(|n| n == name)
}

#[derive(Default)]
struct AuthorParts {
    last_name: String,
    fore_name: String,
    collective_name: String,
}

#[derive(Default)]
struct ArticleBuilder {
    pmid: String,
    pmid_done: bool,
    title: String,
    journal: String,
    year: String,
    month: String,
    day: String,
    medline_date: String,
    sections: Vec<String>,
    section_label: Option<String>,
    section_text: String,
    author: Option<AuthorParts>,
    authors: Vec<String>,
    keyword: String,
    keywords: Vec<String>,
    publication_type: String,
    publication_types: Vec<String>,
}

impl ArticleBuilder {
    fn open(&mut self, name: &str, e: &BytesStart<'_>, stack: &[String]) {
        match name {
            "AbstractText" if !within(stack, "OtherAbstract") => {
                self.section_text.clear();
                self.section_label = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"Label")
                    .map(|attr| String::from_utf8_lossy(&attr.value).trim().to_string())
                    .filter(|label| !label.is_empty());
            }
            "Author" if parent_is(stack, "AuthorList") => {
                self.author = Some(AuthorParts::default());
            }
            _ => {}
        }
    }

    fn text(&mut self, stack: &[String], text: &str) {
        let Some(current) = stack.last().map(String::as_str) else {
            return;
        };

        if within(stack, "ArticleTitle") {
            self.title.push_str(text);
            return;
        }
        if within(stack, "AbstractText") && !within(stack, "OtherAbstract") {
            self.section_text.push_str(text);
            return;
        }

        match current {
            "PMID" if !self.pmid_done && within(stack, "MedlineCitation") => {
                let parent = stack.len().checked_sub(2).map(|i| stack[i].as_str());
                if parent == Some("MedlineCitation") {
                    self.pmid.push_str(text);
                }
            }
            "Title" if parent_is(&stack[..stack.len() - 1], "Journal") => {
                self.journal.push_str(text);
            }
            "Year" if within(stack, "PubDate") => self.year.push_str(text),
            "Month" if within(stack, "PubDate") => self.month.push_str(text),
            "Day" if within(stack, "PubDate") => self.day.push_str(text),
            "MedlineDate" if within(stack, "PubDate") => self.medline_date.push_str(text),
            "LastName" | "ForeName" | "CollectiveName" => {
                if let Some(author) = self.author.as_mut() {
                    match current {
                        "LastName" => author.last_name.push_str(text),
                        "ForeName" => author.fore_name.push_str(text),
                        _ => author.collective_name.push_str(text),
                    }
                }
            }
            "Keyword" => self.keyword.push_str(text),
            "PublicationType" => self.publication_type.push_str(text),
            _ => {
                // Inline markup inside a collective name
                if let Some(author) = self.author.as_mut() {
                    if within(stack, "CollectiveName") {
                        author.collective_name.push_str(text);
                    }
                }
            }
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "PMID" if !self.pmid.trim().is_empty() => self.pmid_done = true,
            "AbstractText" => {
                let text = collapse_whitespace(&self.section_text);
                if !text.is_empty() {
                    let section = match self.section_label.take() {
                        Some(label) => format!("{label}: {text}"),
                        None => text,
                    };
                    self.sections.push(section);
                }
                self.section_text.clear();
            }
            "Author" => {
                if let Some(author) = self.author.take() {
                    if let Some(name) = author.display_name() {
                        self.authors.push(name);
                    }
                }
            }
            "Keyword" => {
                let keyword = collapse_whitespace(&std::mem::take(&mut self.keyword));
                if !keyword.is_empty() {
                    self.keywords.push(keyword);
                }
            }
            "PublicationType" => {
                let pt = collapse_whitespace(&std::mem::take(&mut self.publication_type));
                if !pt.is_empty() && !self.publication_types.contains(&pt) {
                    self.publication_types.push(pt);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Option<EvidenceRecord> {
        let pmid = self.pmid.trim().to_string();
        if pmid.is_empty() {
            return None;
        }

        let publication_date = format_date(&self.year, &self.month, &self.day, &self.medline_date);

        Some(EvidenceRecord {
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            publication_date,
            journal: collapse_whitespace(&self.journal),
            abstract_text: self.sections.join("\n"),
            keywords: self.keywords,
            publication_types: self.publication_types,
            ..EvidenceRecord::new(pmid)
        })
    }
}

impl AuthorParts {
    fn display_name(&self) -> Option<String> {
        let collective = collapse_whitespace(&self.collective_name);
        if !collective.is_empty() {
            return Some(collective);
        }
        let name = collapse_whitespace(&format!("{} {}", self.fore_name, self.last_name));
        (!name.is_empty()).then_some(name)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn parse_month(month: &str) -> Option<u32> {
    let month = month.trim();
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix: String = month.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// `YYYY[-MM[-DD]]` from the structured date, else the year of `MedlineDate`.
fn format_date(year: &str, month: &str, day: &str, medline_date: &str) -> String {
    let year = year.trim();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        let mut date = year.to_string();
        if let Some(m) = parse_month(month) {
            date.push_str(&format!("-{m:02}"));
            if let Ok(d) = day.trim().parse::<u32>() {
                if (1..=31).contains(&d) {
                    date.push_str(&format!("-{d:02}"));
                }
            }
        }
        return date;
    }

    medline_date
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| part.len() == 4)
        .map(str::to_string)
        .unwrap_or_default()
}
