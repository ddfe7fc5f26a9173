/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 对象的文本描述格式，形如：
 *                   NNet(
 *                       nhidden = 4,
 *                       cost_funcs = ["mse", "class_error"],
 *                       optimizer = GradientOptimizer(start_learning_rate = 0.01)
 *                   )
 *                 列表、对象内的逗号可省略；`#`到行尾为注释；未加引号的单词视为字符串。
 */

use super::error::ObjectError;
use super::value::{ObjectSpec, OptionValue};

const INDENT: &str = "    ";

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓输出↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
fn write_real(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        // `{:?}`总会保留小数点或指数，读回时不会被误认为整数
        format!("{x:?}")
    }
}

fn write_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_into(value: &OptionValue, depth: usize, out: &mut String) {
    match value {
        OptionValue::Int(i) => out.push_str(&i.to_string()),
        OptionValue::UInt(u) => out.push_str(&u.to_string()),
        OptionValue::Real(r) => out.push_str(&write_real(*r)),
        OptionValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        OptionValue::Str(s) => out.push_str(&write_str(s)),
        OptionValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_into(item, depth, out);
            }
            out.push(']');
        }
        OptionValue::Object(spec) => write_spec_into(spec, depth, out),
    }
}

fn write_spec_into(spec: &ObjectSpec, depth: usize, out: &mut String) {
    out.push_str(&spec.class_name);
    out.push('(');
    if spec.options.is_empty() {
        out.push(')');
        return;
    }
    out.push('\n');
    for (i, (name, value)) in spec.options.iter().enumerate() {
        out.push_str(&INDENT.repeat(depth + 1));
        out.push_str(name);
        out.push_str(" = ");
        write_into(value, depth + 1, out);
        if i + 1 < spec.options.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(')');
}

/// 单个值的文本形式（嵌套对象会带换行缩进）
pub fn write_value(value: &OptionValue) -> String {
    let mut out = String::new();
    write_into(value, 0, &mut out);
    out
}

pub fn write_object(spec: &ObjectSpec) -> String {
    let mut out = String::new();
    write_spec_into(spec, 0, &mut out);
    out
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑输出↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓解析↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ObjectError {
        let (mut line, mut column) = (1, 1);
        for &c in &self.chars[..self.pos.min(self.chars.len())] {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        ObjectError::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ObjectError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("期望“{want}”，实际为“{c}”"))),
            None => Err(self.error(format!("期望“{want}”，但文本已结束"))),
        }
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '-' | '+' | '/')
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_word_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn value(&mut self) -> Result<OptionValue, ObjectError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("期望一个值，但文本已结束")),
            Some('[') => self.list(),
            Some('"') => self.string().map(OptionValue::Str),
            Some(c) if Self::is_word_char(c) => {
                let start = self.pos;
                let word = self.word();
                self.skip_ws();
                if self.peek() == Some('(') {
                    if !word.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
                        self.pos = start;
                        return Err(self.error(format!("“{word}”不是合法的类型名")));
                    }
                    return self.object_body(word).map(OptionValue::Object);
                }
                Ok(Self::scalar(word))
            }
            Some(c) => Err(self.error(format!("意外的字符“{c}”"))),
        }
    }

    fn scalar(word: String) -> OptionValue {
        match word.as_str() {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            "nan" | "NaN" => return OptionValue::Real(f64::NAN),
            "inf" | "+inf" => return OptionValue::Real(f64::INFINITY),
            "-inf" => return OptionValue::Real(f64::NEG_INFINITY),
            _ => {}
        }
        if let Ok(i) = word.parse::<i64>() {
            return OptionValue::Int(i);
        }
        if let Ok(u) = word.parse::<u64>() {
            return OptionValue::UInt(u);
        }
        if word.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
            if let Ok(r) = word.parse::<f64>() {
                return OptionValue::Real(r);
            }
        }
        OptionValue::Str(word)
    }

    fn string(&mut self) -> Result<String, ObjectError> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("字符串缺少结尾的引号")),
                Some('"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(c @ ('"' | '\\')) => c,
                        Some(c) => return Err(self.error(format!("不支持的转义“\\{c}”"))),
                        None => return Err(self.error("字符串缺少结尾的引号")),
                    };
                    out.push(escaped);
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn list(&mut self) -> Result<OptionValue, ObjectError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(OptionValue::List(items));
                }
                Some(',') => self.pos += 1,
                None => return Err(self.error("列表缺少结尾的“]”")),
                Some(_) => items.push(self.value()?),
            }
        }
    }

    fn object_body(&mut self, class_name: String) -> Result<ObjectSpec, ObjectError> {
        self.expect('(')?;
        let mut spec = ObjectSpec::new(&class_name);
        loop {
            self.skip_ws();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    return Ok(spec);
                }
                Some(',') => self.pos += 1,
                None => return Err(self.error(format!("{class_name}缺少结尾的“)”"))),
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let name = self.word();
                    self.expect('=')?;
                    let value = self.value()?;
                    spec.options.push((name, value));
                }
                Some(c) => return Err(self.error(format!("期望选项名，实际为“{c}”"))),
            }
        }
    }

    fn finish(&mut self) -> Result<(), ObjectError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("多余的内容“{c}”"))),
        }
    }
}

/// 解析单个值
pub fn parse_value(text: &str) -> Result<OptionValue, ObjectError> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.finish()?;
    Ok(value)
}

/// 解析一个完整的对象描述
pub fn parse_object(text: &str) -> Result<ObjectSpec, ObjectError> {
    match parse_value(text)? {
        OptionValue::Object(spec) => Ok(spec),
        other => Err(ObjectError::Parse {
            line: 1,
            column: 1,
            message: other.expected("对象描述"),
        }),
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑解析↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
