use std::collections::BTreeMap;

use quill_core::UiLanguage;

#[derive(Debug, Clone)]
pub struct I18n {
    lang: UiLanguage,
    vi_vn: BTreeMap<&'static str, &'static str>,
    en_us: BTreeMap<&'static str, &'static str>,
}

impl I18n {
    pub fn new(lang: UiLanguage) -> Self {
        Self {
            lang,
            vi_vn: vi_vn_map(),
            en_us: en_us_map(),
        }
    }

    pub fn set_language(&mut self, lang: UiLanguage) {
        self.lang = lang;
    }

    pub fn language(&self) -> UiLanguage {
        self.lang
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        match self.lang {
            UiLanguage::ViVn => self
                .vi_vn
                .get(key)
                .copied()
                .or_else(|| self.en_us.get(key).copied())
                .unwrap_or(key),
            UiLanguage::EnUs => self
                .en_us
                .get(key)
                .copied()
                .or_else(|| self.vi_vn.get(key).copied())
                .unwrap_or(key),
        }
    }
}

fn vi_vn_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "Blog cá nhân Quill"),
        ("list.empty", "Chưa có bài viết nào."),
        ("list.read", "Đọc"),
        ("list.edit", "Sửa"),
        ("list.delete", "Xoá"),
        ("post.not_found", "Không tìm thấy bài viết"),
        ("post.invalid_link", "Liên kết không hợp lệ hoặc bài đã bị xoá."),
        ("post.deleted", "Đã xoá bài viết."),
        ("editor.saved", "Đã lưu bài viết."),
        ("editor.no_image", "Chưa có ảnh"),
        ("image.error", "Không xử lý được ảnh. Vui lòng thử ảnh khác."),
    ])
}

fn en_us_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "Quill personal blog"),
        ("list.empty", "No posts yet."),
        ("list.read", "Read"),
        ("list.edit", "Edit"),
        ("list.delete", "Delete"),
        ("post.not_found", "Post not found"),
        ("post.invalid_link", "The link is invalid or the post was deleted."),
        ("post.deleted", "Post deleted."),
        ("editor.saved", "Post saved."),
        ("editor.no_image", "No image yet"),
        ("image.error", "Could not process the image. Please try another one."),
    ])
}
