use async_trait::async_trait;

use rollcall_model::{NewStudent, Student, StudentId, StudentUpdate};

use crate::error::Result;

/// Student directory access. The barcode is the unique scan key; `create`
/// fails with `Conflict` when it is already taken.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, new: NewStudent) -> Result<Student>;
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Student>>;
    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>>;
    async fn all(&self) -> Result<Vec<Student>>;
    async fn update(&self, id: StudentId, update: StudentUpdate) -> Result<Student>;
    async fn delete(&self, id: StudentId) -> Result<()>;
    async fn classes(&self) -> Result<Vec<String>>;
}
