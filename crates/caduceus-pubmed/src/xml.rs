//! Serde mapping for PubMed efetch XML responses.

use caduceus_core::EvidenceDocument;
use serde::Deserialize;

use crate::LiteratureError;

#[derive(Debug, Deserialize)]
pub(crate) struct PubmedArticleSet {
    #[serde(rename = "PubmedArticle", default)]
    articles: Vec<PubmedArticle>,
}

#[derive(Debug, Deserialize)]
struct PubmedArticle {
    #[serde(rename = "MedlineCitation")]
    citation: MedlineCitation,
}

#[derive(Debug, Deserialize)]
struct MedlineCitation {
    #[serde(rename = "PMID")]
    pmid: Pmid,
    #[serde(rename = "Article")]
    article: Article,
    #[serde(rename = "MeshHeadingList")]
    mesh_heading_list: Option<MeshHeadingList>,
    #[serde(rename = "KeywordList")]
    keyword_list: Option<KeywordList>,
}

#[derive(Debug, Deserialize)]
struct Pmid {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(rename = "ArticleTitle")]
    title: Option<String>,
    #[serde(rename = "Abstract")]
    abstract_data: Option<AbstractData>,
    #[serde(rename = "AuthorList")]
    author_list: Option<AuthorList>,
    #[serde(rename = "Journal")]
    journal: Option<Journal>,
}

#[derive(Debug, Deserialize)]
struct AbstractData {
    #[serde(rename = "AbstractText", default)]
    sections: Vec<AbstractText>,
}

#[derive(Debug, Deserialize)]
struct AbstractText {
    #[serde(rename = "@Label")]
    label: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AuthorList {
    #[serde(rename = "Author", default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(rename = "LastName")]
    last_name: Option<String>,
    #[serde(rename = "ForeName")]
    fore_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Journal {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "JournalIssue")]
    issue: Option<JournalIssue>,
}

#[derive(Debug, Deserialize)]
struct JournalIssue {
    #[serde(rename = "PubDate")]
    pub_date: Option<PubDate>,
}

#[derive(Debug, Deserialize)]
struct PubDate {
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Day")]
    day: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeshHeadingList {
    #[serde(rename = "MeshHeading", default)]
    headings: Vec<MeshHeading>,
}

#[derive(Debug, Deserialize)]
struct MeshHeading {
    #[serde(rename = "DescriptorName")]
    descriptor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordList {
    #[serde(rename = "Keyword", default)]
    keywords: Vec<Keyword>,
}

#[derive(Debug, Deserialize)]
struct Keyword {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Parse an efetch XML payload into evidence documents.
/// Articles without a PMID are dropped.
pub(crate) fn parse_articles(xml: &str) -> Result<Vec<EvidenceDocument>, LiteratureError> {
    let set: PubmedArticleSet = quick_xml::de::from_str(xml)?;
    Ok(set
        .articles
        .into_iter()
        .filter_map(|a| to_document(a.citation))
        .collect())
}

fn to_document(citation: MedlineCitation) -> Option<EvidenceDocument> {
    let pmid = citation.pmid.value.trim().to_string();
    if pmid.is_empty() {
        return None;
    }
    let article = citation.article;

    // Labelled abstract sections keep their label prefix ("RESULTS: ...").
    let content = article
        .abstract_data
        .map(|a| {
            a.sections
                .iter()
                .filter(|s| !s.text.is_empty())
                .map(|s| match &s.label {
                    Some(label) if !label.is_empty() => format!("{label}: {}", s.text),
                    _ => s.text.clone(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let authors = article
        .author_list
        .map(|al| {
            al.authors
                .into_iter()
                .filter_map(|a| {
                    let last = a.last_name?;
                    Some(match a.fore_name {
                        Some(fore) if !fore.is_empty() => format!("{last}, {fore}"),
                        _ => last,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let (journal, pub_date) = article
        .journal
        .map(|j| {
            let date = j
                .issue
                .and_then(|i| i.pub_date)
                .map(|d| {
                    let mut s = d.year.unwrap_or_default();
                    if let Some(month) = d.month
                        && !s.is_empty()
                    {
                        s.push('-');
                        s.push_str(&month);
                        if let Some(day) = d.day {
                            s.push('-');
                            s.push_str(&day);
                        }
                    }
                    s
                })
                .unwrap_or_default();
            (j.title.unwrap_or_default(), date)
        })
        .unwrap_or_default();

    let mesh_terms = citation
        .mesh_heading_list
        .map(|m| m.headings.into_iter().filter_map(|h| h.descriptor).collect())
        .unwrap_or_default();

    let keywords = citation
        .keyword_list
        .map(|k| {
            k.keywords
                .into_iter()
                .map(|kw| kw.value)
                .filter(|v| !v.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(EvidenceDocument {
        pmid: Some(pmid),
        title: article.title.unwrap_or_default(),
        content,
        journal,
        pub_date,
        authors,
        keywords,
        mesh_terms,
        relevance: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE">
      <PMID Version="1">38012345</PMID>
      <Article PubModel="Print">
        <Journal>
          <Title>The Lancet</Title>
          <JournalIssue CitedMedium="Internet">
            <PubDate><Year>2026</Year><Month>Mar</Month><Day>14</Day></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>Intensive blood pressure control: a randomized controlled trial</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Hypertension drives cardiovascular risk.</AbstractText>
          <AbstractText Label="CONCLUSIONS">Intensive control reduced events by 25 percent.</AbstractText>
        </Abstract>
        <AuthorList>
          <Author><LastName>Okafor</LastName><ForeName>Adaeze</ForeName></Author>
          <Author><LastName>Lindqvist</LastName></Author>
        </AuthorList>
      </Article>
      <MeshHeadingList>
        <MeshHeading><DescriptorName UI="D006973">Hypertension</DescriptorName></MeshHeading>
        <MeshHeading><DescriptorName UI="D000959">Antihypertensive Agents</DescriptorName></MeshHeading>
      </MeshHeadingList>
      <KeywordList Owner="NOTNLM">
        <Keyword MajorTopicYN="N">blood pressure</Keyword>
      </KeywordList>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE">
      <PMID Version="1"></PMID>
      <Article PubModel="Print">
        <ArticleTitle>No identifier here</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parses_article_fields() {
        let docs = parse_articles(FIXTURE).unwrap();
        assert_eq!(docs.len(), 1, "article without PMID must be dropped");

        let d = &docs[0];
        assert_eq!(d.pmid.as_deref(), Some("38012345"));
        assert!(d.title.starts_with("Intensive blood pressure"));
        assert_eq!(d.journal, "The Lancet");
        assert_eq!(d.pub_date, "2026-Mar-14");
        assert_eq!(d.pub_year(), Some(2026));
        assert_eq!(d.authors, vec!["Okafor, Adaeze", "Lindqvist"]);
        assert_eq!(d.mesh_terms.len(), 2);
        assert_eq!(d.keywords, vec!["blood pressure"]);
    }

    #[test]
    fn labelled_abstract_sections_keep_labels() {
        let docs = parse_articles(FIXTURE).unwrap();
        let content = &docs[0].content;
        assert!(content.contains("BACKGROUND: Hypertension"));
        assert!(content.contains("CONCLUSIONS: Intensive control"));
    }

    #[test]
    fn empty_set_parses() {
        let docs = parse_articles("<PubmedArticleSet></PubmedArticleSet>").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_articles("<PubmedArticleSet><oops").is_err());
    }
}
