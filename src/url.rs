use url::{ParseError, Url};

const MARKDOWN_EXTENSION: &str = ".md";

/// Resolves link targets found in a document body. Relative targets are
/// resolved against the document's own URL; targets that land on a markdown
/// file inside the site root are rewritten to the served document path
/// (`foo.md` becomes `foo`).
pub struct Converter<'a> {
    site_root: &'a Url,
    base: Url,
}

impl<'a> Converter<'a> {
    /// Constructs a new `Converter`
    ///
    /// # Arguments
    ///
    /// * `site_root` - the URL the documents are served under. This should
    ///   end in a trailing slash.
    /// * `document` - the document path relative to `site_root` (e.g.,
    ///   `2021/hello`) from which relative targets will be resolved.
    pub fn new(site_root: &'a Url, document: &str) -> Result<Converter<'a>> {
        Ok(Converter {
            site_root,
            base: site_root.join(document.trim_start_matches('/'))?,
        })
    }

    fn convert_absolute(&self, mut absolute: Url) -> Url {
        if let Some(relative) = self.site_root.make_relative(&absolute) {
            if !relative.starts_with("../")
                && absolute.path().ends_with(MARKDOWN_EXTENSION)
            {
                let path = absolute
                    .path()
                    .trim_end_matches(MARKDOWN_EXTENSION)
                    .to_owned();
                absolute.set_path(&path);
            }
        }
        absolute
    }

    fn convert_unknown(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(self.convert_absolute(absolute)),
            Err(ParseError::RelativeUrlWithoutBase) => {
                Ok(self.convert_absolute(self.base.join(url)?))
            }
            Err(e) => Err(e),
        }
    }

    pub fn convert(&self, url: &str) -> Result<String> {
        Ok(self.convert_unknown(url)?.to_string())
    }
}

type Result<T> = std::result::Result<T, ParseError>;
