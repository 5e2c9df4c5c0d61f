//! 宏工具函数

use syn::{Error, Expr, Lit, Path, Result};

/// 选项名称，多段路径按原样拼接
pub fn option_name(path: &Path) -> String {
    path.get_ident().map_or_else(
        || {
            path.segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect::<Vec<_>>()
                .join("::")
        },
        ToString::to_string,
    )
}

/// 取出字符串字面量
pub fn expect_string(expr: &Expr) -> Result<String> {
    if let Expr::Lit(expr_lit) = expr {
        if let Lit::Str(lit_str) = &expr_lit.lit {
            return Ok(lit_str.value());
        }
    }
    Err(Error::new_spanned(expr, "expected a string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_name() {
        let simple: Path = syn::parse_str("tag").unwrap();
        let nested: Path = syn::parse_str("wiring::tag").unwrap();

        assert_eq!(option_name(&simple), "tag");
        assert_eq!(option_name(&nested), "wiring::tag");
    }

    #[test]
    fn test_expect_string() {
        let literal: Expr = syn::parse_str("\"app::Mailer\"").unwrap();
        let number: Expr = syn::parse_str("42").unwrap();

        assert_eq!(expect_string(&literal).unwrap(), "app::Mailer");
        assert!(expect_string(&number).is_err());
    }
}
