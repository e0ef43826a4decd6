// 外部系統的具體實作: 檔案儲存, 試算表讀取, 文件輸出, 照片編碼
pub mod docx;
#[cfg(feature = "photos")]
pub mod jpeg;
pub mod spreadsheet;
pub mod storage;

pub use docx::DocxRenderer;
#[cfg(feature = "photos")]
pub use jpeg::JpegCodec;
pub use spreadsheet::load_spreadsheet;
pub use storage::LocalStorage;
