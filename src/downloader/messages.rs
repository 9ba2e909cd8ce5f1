// User-facing status lines (Arabic UI)

pub fn starting(current: u32, total: u32) -> String {
    format!("جارٍ التحميل... {} من {}", current, total)
}

pub fn downloading(current: u32, total: u32, speed_mb: f64) -> String {
    format!(
        "جارٍ تحميل الفيديو {} من {} ({:.1} MB/s)",
        current, total, speed_mb
    )
}

pub fn item_finished(completed: u32, total: u32) -> String {
    format!("تم تحميل الفيديو {} من {}", completed, total)
}

pub fn all_finished() -> String {
    "اكتمل تحميل جميع الفيديوهات".to_string()
}

pub fn error(detail: &impl std::fmt::Display) -> String {
    format!("حدث خطأ: {}", detail)
}

pub fn skipped_entries(lines: &[String]) -> String {
    format!("تعذر تحميل {} من الفيديوهات: {}", lines.len(), lines.join(" | "))
}

pub fn exported(title: &str) -> String {
    format!("تم نقل الملفات إلى مجلد القائمة: {}", title)
}

pub fn export_failed(detail: &impl std::fmt::Display) -> String {
    format!("خطأ في نقل الملفات: {}", detail)
}

pub fn session_succeeded() -> String {
    "اكتمل التحميل بنجاح!".to_string()
}

pub fn session_failed() -> String {
    "حدث خطأ أثناء التحميل.".to_string()
}

pub fn invalid_url() -> String {
    "يرجى إدخال رابط صالح".to_string()
}
