//! Converts a markdown document body into [`Section`]s and renders sections
//! back to HTML. Both directions run link targets through the
//! [`LinkConverter`] so that links between documents point at served paths.

use crate::document::{Code, Element, Image, Section, Text};
use crate::url::Converter as LinkConverter;
use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag};
use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Splits `markdown` into sections. A heading of level 1 or 2 starts a new
/// section; anything before the first such heading goes into an untitled
/// leading section, which is dropped if empty. Every other top-level block
/// becomes one [`Element`].
pub fn parse_sections(
    markdown: &str,
    link_converter: &LinkConverter,
) -> Result<Vec<Section>, Error> {
    let event_converter = EventConverter { link_converter };
    let mut sections = vec![Section::default()];
    let mut block = Block::default();
    let mut depth = 0usize;

    for (ev, range) in Parser::new_ext(markdown, options()).into_offset_iter() {
        match ev {
            Event::Start(tag) => {
                depth += 1;
                if depth == 1 {
                    block = Block {
                        source: &markdown[range],
                        ..Block::default()
                    };
                } else if depth == 2 && block.is_paragraph() {
                    match &tag {
                        Tag::Image(_, dest, title) if block.image.is_none() => {
                            block.image = Some(Image {
                                url: link_converter.convert(dest)?,
                                alt: String::new(),
                                title: title.to_string(),
                            });
                        }
                        _ => block.mixed = true,
                    }
                }
                let tag = event_converter.convert_tag(tag)?;
                if depth == 1 {
                    block.tag = Some(tag.clone());
                }
                block.events.push(Event::Start(tag));
            }
            Event::End(tag) => {
                depth -= 1;
                block.events.push(Event::End(tag));
                if depth == 0 {
                    let finished = std::mem::take(&mut block);
                    finished.finish(&mut sections)?;
                }
            }
            ev if depth == 0 => {
                // Raw HTML blocks and rules don't open a tag.
                let mut out = String::new();
                html::push_html(&mut out, std::iter::once(ev));
                push_html_element(current(&mut sections), out);
            }
            ev => {
                if let (Event::Text(text) | Event::Code(text), Some(Tag::Heading(..))) =
                    (&ev, &block.tag)
                {
                    block.text.push_str(text);
                } else if let Some(Tag::CodeBlock(_)) = &block.tag {
                    if let Event::Text(text) = &ev {
                        block.text.push_str(text);
                    }
                } else if block.is_paragraph() {
                    match (&ev, depth, block.image.as_mut()) {
                        (Event::Text(alt), d, Some(image)) if d > 1 => image.alt.push_str(alt),
                        (Event::Text(text), 1, _) if text.trim().is_empty() => {}
                        (_, 1, _) => block.mixed = true,
                        _ => {}
                    }
                }
                block.events.push(ev);
            }
        }
    }

    if sections[0].title.is_none() && sections[0].elements.is_empty() {
        sections.remove(0);
    }
    Ok(sections)
}

fn current<'s>(sections: &'s mut Vec<Section>) -> &'s mut Section {
    if sections.is_empty() {
        sections.push(Section::default());
    }
    let last = sections.len() - 1;
    &mut sections[last]
}

fn push_html_element(section: &mut Section, html: String) {
    match section.elements.last_mut() {
        Some(Element::Html(previous)) => previous.push_str(&html),
        _ => section.elements.push(Element::Html(html)),
    }
}

/// Accumulates one top-level block while it is being parsed.
#[derive(Default)]
struct Block<'a> {
    /// The opening tag of the block.
    tag: Option<Tag<'a>>,

    /// The markdown source of the block.
    source: &'a str,

    /// All events of the block, links already converted.
    events: Vec<Event<'a>>,

    /// Heading text or code block contents.
    text: String,

    /// The first image of a paragraph.
    image: Option<Image>,

    /// Set when a paragraph holds anything besides a single image.
    mixed: bool,
}

impl<'a> Block<'a> {
    fn is_paragraph(&self) -> bool {
        matches!(self.tag, Some(Tag::Paragraph))
    }

    fn finish(self, sections: &mut Vec<Section>) -> Result<(), Error> {
        match self.tag {
            Some(Tag::Heading(HeadingLevel::H1 | HeadingLevel::H2, _, _)) => {
                sections.push(Section {
                    title: Some(self.text.trim().to_owned()),
                    elements: Vec::new(),
                });
            }
            Some(Tag::Paragraph) => {
                let element = match (self.image, self.mixed) {
                    (Some(image), false) => Element::Image(image),
                    _ => {
                        // Rendered from this pass's events so reference
                        // definitions anywhere in the document resolve.
                        let mut html = String::new();
                        html::push_html(&mut html, self.events.into_iter());
                        Element::Text(Text {
                            lines: self
                                .source
                                .lines()
                                .map(str::trim)
                                .filter(|line| !line.is_empty())
                                .map(str::to_owned)
                                .collect(),
                            html,
                            pre: false,
                        })
                    }
                };
                current(sections).elements.push(element);
            }
            Some(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                current(sections).elements.push(Element::Text(Text {
                    lines: self.text.lines().map(str::to_owned).collect(),
                    html: String::new(),
                    pre: true,
                }));
            }
            Some(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                current(sections).elements.push(Element::Code(Code {
                    lang: info.split_whitespace().next().unwrap_or_default().to_owned(),
                    source: self.text,
                }));
            }
            _ => {
                let mut out = String::new();
                html::push_html(&mut out, self.events.into_iter());
                push_html_element(current(sections), out);
            }
        }
        Ok(())
    }
}

/// Renders sections into the HTML body of a document, appending to `w`.
pub fn render_sections(w: &mut String, sections: &[Section]) -> Result<(), Error> {
    for section in sections {
        if let Some(title) = &section.title {
            w.push_str(r#"<h3 id=""#);
            escape_href(&mut *w, &slug::slugify(title))?;
            w.push_str(r#"">"#);
            escape_html(&mut *w, title)?;
            w.push_str("</h3>\n");
        }
        for element in &section.elements {
            render_element(w, element)?;
        }
    }
    Ok(())
}

fn render_element(w: &mut String, element: &Element) -> Result<(), Error> {
    match element {
        Element::Text(Text {
            lines, pre: true, ..
        }) => {
            w.push_str("<pre>");
            escape_html(&mut *w, &lines.join("\n"))?;
            w.push_str("</pre>\n");
        }
        Element::Text(Text {
            html, pre: false, ..
        }) => w.push_str(html),
        Element::Code(Code { lang, source }) => {
            match lang.is_empty() {
                true => w.push_str("<pre><code>"),
                false => {
                    w.push_str(r#"<pre><code class="language-"#);
                    escape_html(&mut *w, lang)?;
                    w.push_str(r#"">"#);
                }
            }
            escape_html(&mut *w, source)?;
            w.push_str("</code></pre>\n");
        }
        Element::Image(Image { url, alt, title }) => {
            w.push_str(r#"<p><img src=""#);
            escape_href(&mut *w, url)?;
            w.push_str(r#"" alt=""#);
            escape_html(&mut *w, alt)?;
            w.push('"');
            if !title.is_empty() {
                w.push_str(r#" title=""#);
                escape_html(&mut *w, title)?;
                w.push('"');
            }
            w.push_str(" /></p>\n");
        }
        Element::Html(html) => w.push_str(html),
    }
    Ok(())
}

/// Returns the first paragraph of text from the first section as inline
/// HTML: the paragraph wrapper is dropped and the result ends in a newline.
/// Preformatted text, code and images are skipped.
pub fn summary(sections: &[Section]) -> String {
    let first = match sections.first() {
        Some(section) => section,
        None => return String::new(),
    };
    for element in &first.elements {
        let html = match element {
            Element::Text(Text {
                html, pre: false, ..
            }) => html.trim_end(),
            _ => continue,
        };
        let inner = html
            .strip_prefix("<p>")
            .and_then(|inner| inner.strip_suffix("</p>"))
            .unwrap_or(html);
        return format!("{}\n", inner);
    }
    String::new()
}

struct EventConverter<'a> {
    link_converter: &'a LinkConverter<'a>,
}

impl<'a> EventConverter<'a> {
    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, UrlParseError> {
        Ok(match tag {
            // Links between documents are written against the source files
            // (`foo.md`) and need to point at the served paths instead.
            Tag::Link(link_type, url, title) => Tag::Link(
                link_type,
                CowStr::Boxed(self.link_converter.convert(&url)?.into_boxed_str()),
                title,
            ),
            Tag::Image(link_type, url, title) => Tag::Image(
                link_type,
                CowStr::Boxed(self.link_converter.convert(&url)?.into_boxed_str()),
                title,
            ),
            _ => tag,
        })
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Returned when there is a problem parsing URLs.
    #[error(transparent)]
    UrlParse(#[from] UrlParseError),
}
