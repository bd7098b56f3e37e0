use thiserror::Error;

/// One article extracted from the dump: its title and raw wiki markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    title: String,
    raw_text: String,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("page has no title")]
    MissingTitle,
    #[error("page has no revision text")]
    MissingText,
}

impl PageRecord {
    /// Builds a record from the raw fields of a page element.
    ///
    /// Both fields are trimmed; a field that is absent or blank after trimming
    /// rejects the page.
    pub fn from_fields(
        title: Option<&str>,
        raw_text: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTitle)?;
        let raw_text = raw_text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingText)?;
        Ok(Self {
            title: title.to_string(),
            raw_text: raw_text.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn into_parts(self) -> (String, String) {
        (self.title, self.raw_text)
    }
}

/// A page element that did not yield a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPage {
    /// Zero-based ordinal of the page element within the dump.
    pub ordinal: u64,
    pub title: Option<String>,
    pub reason: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::{PageRecord, ValidationError};

    #[test]
    fn trims_fields() {
        let record = PageRecord::from_fields(Some("  Title \n"), Some("\n body ")).unwrap();
        assert_eq!(record.title(), "Title");
        assert_eq!(record.raw_text(), "body");
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            PageRecord::from_fields(None, Some("text")),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            PageRecord::from_fields(Some("   "), Some("text")),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            PageRecord::from_fields(Some("Title"), Some(" \n\t")),
            Err(ValidationError::MissingText)
        );
        assert_eq!(
            PageRecord::from_fields(Some("Title"), None),
            Err(ValidationError::MissingText)
        );
    }
}
