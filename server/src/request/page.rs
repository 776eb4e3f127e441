use error_stack::Report;
use serde::Deserialize;

use application::transfer::GetPageDto;
use kernel::KernelError;

use crate::controller::TryIntake;

#[derive(Debug, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    page_id: i64,
}

impl PageRequest {
    pub fn new(page_id: i64) -> Self {
        Self { page_id }
    }

    pub(crate) fn cursor(&self) -> error_stack::Result<i64, KernelError> {
        if self.page_id < 0 {
            return Err(Report::new(KernelError::Validation)
                .attach_printable("page_id must not be negative"));
        }
        Ok(self.page_id)
    }
}

pub struct PageTransformer;

impl TryIntake<PageRequest> for PageTransformer {
    type To = GetPageDto;
    type Error = Report<KernelError>;
    fn emit(&self, input: PageRequest) -> Result<Self::To, Self::Error> {
        Ok(GetPageDto {
            page_id: input.cursor()?,
        })
    }
}
