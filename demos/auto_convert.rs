use opencc_fmm16::OpenCC;

fn main() {
    let input_text = match std::env::args().nth(1) {
        Some(text) => text,
        None => "汉字转换，“头发干燥”！计算机内存。".to_string(),
    };

    let converter = OpenCC::new();
    let input_code = converter.zho_check(&input_text);

    let config = match input_code {
        1 => "t2s",
        _ => "s2t",
    };

    let punct = true;
    let output_text = converter.convert(&input_text, config, punct);

    println!(
        "Input code: {}, config: {}, punctuation: {}",
        input_code, config, punct
    );
    println!("Converted:\n{}", output_text);
}
