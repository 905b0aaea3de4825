use std::fs;
use std::path::{Path, PathBuf};

use super::grade::Grade;
use super::service::ResultPage;

/// HTML documents served to human applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    ApplicationForm,
    Approved,
    Rejected,
}

impl Page {
    pub const fn file_name(self) -> &'static str {
        match self {
            Page::ApplicationForm => "index.html",
            Page::Approved => "result_approve.html",
            Page::Rejected => "result_reject.html",
        }
    }
}

impl From<ResultPage> for Page {
    fn from(page: ResultPage) -> Self {
        match page {
            ResultPage::Approve => Page::Approved,
            ResultPage::Reject => Page::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageContext {
    pub grade: Option<Grade>,
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, page: Page, context: &PageContext) -> Result<String, PageError>;
}

const GRADE_SLOT: &str = "{{ grade }}";

/// Static HTML templates with a `{{ grade }}` slot.
#[derive(Debug, Clone)]
pub struct TemplatePages {
    form: String,
    approved: String,
    rejected: String,
}

impl TemplatePages {
    /// Copies compiled into the binary from `frontend/templates`.
    pub fn embedded() -> Self {
        Self {
            form: include_str!("../../../../frontend/templates/index.html").to_string(),
            approved: include_str!("../../../../frontend/templates/result_approve.html")
                .to_string(),
            rejected: include_str!("../../../../frontend/templates/result_reject.html")
                .to_string(),
        }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PageError> {
        let dir = dir.as_ref();
        let read = |page: Page| {
            let path = dir.join(page.file_name());
            fs::read_to_string(&path).map_err(|source| PageError::Io { path, source })
        };

        Ok(Self {
            form: read(Page::ApplicationForm)?,
            approved: read(Page::Approved)?,
            rejected: read(Page::Rejected)?,
        })
    }

    fn template(&self, page: Page) -> &str {
        match page {
            Page::ApplicationForm => &self.form,
            Page::Approved => &self.approved,
            Page::Rejected => &self.rejected,
        }
    }
}

impl PageRenderer for TemplatePages {
    fn render(&self, page: Page, context: &PageContext) -> Result<String, PageError> {
        let template = self.template(page);
        match (page, context.grade) {
            (Page::ApplicationForm, _) => Ok(template.to_string()),
            (_, Some(grade)) => Ok(template.replace(GRADE_SLOT, grade.letter())),
            (_, None) => Err(PageError::MissingGrade { page }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("unable to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{page:?} page needs a grade to render")]
    MissingGrade { page: Page },
}
