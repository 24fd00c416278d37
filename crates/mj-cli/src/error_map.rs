use mj_core::MathJaxError;

pub(crate) fn emit_error(error: MathJaxError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code());
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.to_string()).expect("string json")
    );
    1
}

pub(crate) fn format_item_error(index: usize, error: &MathJaxError) -> String {
    format!(
        "ITEM_ERROR:{}:{}:{}",
        index,
        error.code(),
        serde_json::to_string(&error.to_string()).expect("string json")
    )
}

pub(crate) fn emit_item_error(index: usize, error: &MathJaxError) {
    println!("{}", format_item_error(index, error));
}
