pub mod contato;
pub mod processo;

pub use contato::{Contato, OrigemContato};
pub use processo::Processo;

use chrono::NaiveDate;
use historico::EntityGroup;
use serde::Serialize;

/// Status aplicado pelo arquivamento; arquivar é só uma transição de status
pub const STATUS_ARQUIVADO: &str = "arquivado";

/// Entidade que pode ser selecionada numa tabela do painel e alterada em massa
pub trait BulkEntity: Serialize + Send + Sync {
    const GROUP: EntityGroup;

    fn id(&self) -> &str;
    fn status(&self) -> &str;
    fn tags(&self) -> &[String];
    fn owner(&self) -> Option<&str>;
    fn deadline(&self) -> Option<NaiveDate>;

    fn is_archived(&self) -> bool {
        self.status() == STATUS_ARQUIVADO
    }
}
