//! 表示ラベルと値の整形
//!
//! 企業レコードの項目名（ドット区切りのパス）を日本語ラベルに対応付け、
//! コード値の辞書と数値・日付の整形関数をまとめる。

/// 項目パス → 表示ラベル
pub const FIELD_LABELS: &[(&str, &str)] = &[
    // 会社基本
    ("id", "TSR企業コード"),
    ("name", "会社名（正式）"),
    ("nameKana", "会社名カナ"),
    ("pref", "都道府県"),
    ("outline", "概況"),
    ("rating", "評点"),
    // 法人情報
    ("legal.positionBeforeAfter", "法人格前後区分"),
    ("legal.corpFormCode", "商号法人格コード"),
    ("legal.indexKanjiName", "インデックス漢字商号"),
    ("legal.indexKanaName", "インデックスカナ商号"),
    // 創業・設立
    ("founded.foundingYm", "創業年月（西暦）"),
    ("founded.edoFoundedYear", "江戸時代以前創業年"),
    ("founded.incorporationYmd", "設立年月日（西暦）"),
    // 規模
    ("companyStats.capitalK", "資本金（千円）"),
    ("companyStats.employees", "従業員数"),
    ("companyStats.factories", "工場数"),
    ("companyStats.offices", "事業所数"),
    // データ基準日
    ("dataDates.surveyYmd", "調査年月日"),
    ("dataDates.reportSurveyYmd", "レポート調査年月日"),
    ("dataDates.dbUpdateYmd", "企業DB更新年月日"),
    // 住所
    ("address.zip", "企業郵便番号"),
    ("address.text", "企業所在地"),
    ("address.tel", "企業電話番号"),
    // 業種・扱い品
    ("industry[]", "業種コード"),
    ("industryNames[]", "業種名称"),
    ("products[].code", "扱い品コード"),
    ("products[].name", "扱い品名称"),
    // 取引先
    ("clients[]", "販売先名称"),
    ("suppliers[]", "仕入先名称"),
    // 株主
    ("shareholders[].name", "株主名称"),
    ("shareholders[].ratio", "持株比率（％）"),
    // 役員
    ("officers[].name", "役員名"),
    ("officers[].title", "役名"),
    ("officers[].position", "肩書名"),
    ("officers[].corpFlag", "法人役員識別区分"),
    // 取引銀行
    ("banks[].code", "取引銀行コード"),
    ("banks[].name", "取引銀行名"),
    ("banks[].branch", "取引銀行店舗名"),
    // 事業内容
    ("businessItems[].text", "事業内容"),
    ("businessItems[].ratio", "事業内容構成比率（％）"),
    // 決算
    ("financials[].yearMonth", "決算年月"),
    ("financials[].months", "月数"),
    ("financials[].revenueK", "売上高（千円）"),
    ("financials[].profitK", "利益金（千円）"),
    ("financials[].equityRatio", "自己資本比率（％）"),
    ("financials[].dividendK", "配当総額（千円）"),
    ("financials[].estimateFlag", "見込・推定区分"),
    ("financials[].taxInclFlag", "税込引区分"),
    ("financials[].hasFinance", "財務有無フラグ"),
    // 上場・コード類
    ("listing.market", "上場市場区分"),
    ("listing.ticker", "証券株式コード"),
    ("listing.edinet", "EDINETコード"),
    // 代表者
    ("representative.name", "代表者氏名"),
    ("representative.kana", "代表者氏名カナ"),
    ("representative.title", "代表者役名/肩書名"),
    ("representative.birthYmd", "代表者生年月日（西暦）"),
    ("representative.gender", "代表者男女区分"),
    ("representative.sinceYmd", "代表者就任年月日（西暦）"),
    ("representative.tel", "代表者電話番号"),
    ("representative.zip", "代表者郵便番号"),
    ("representative.address", "代表者現住所"),
    ("representative.addressKana", "代表者現住所カナ"),
    ("representative.addressBarcode", "代表者現住所バーコード情報"),
    ("representative.bankruptcyHistory", "代表者倒産経歴"),
    ("representative.birthplaceCode", "代表者出身地コード"),
    ("representative.birthplaceName", "代表者出身地名称"),
    ("representative.lastEduSchoolCode", "代表者最終学歴_学校コード"),
    ("representative.lastEduSchool", "代表者最終学歴_学校名称"),
    ("representative.lastEduGradType", "代表者最終学歴_卒業区分"),
    ("representative.lastEduDegree", "代表者最終学歴_卒業名"),
    ("representative.zodiacCode", "代表者干支コード"),
    ("representative.zodiacName", "代表者干支名称"),
    ("representative.residenceCode", "代表者住居コード"),
    ("representative.residenceName", "代表者住居名称"),
    ("representative.hobbies[].code", "代表者趣味コード"),
    ("representative.hobbies[].name", "代表者趣味名称"),
];

/// ラベルを引く（未登録ならパスをそのまま返す）
pub fn field_label(path: &str) -> &str {
    FIELD_LABELS
        .iter()
        .find(|(key, _)| *key == path)
        .map(|(_, label)| *label)
        .unwrap_or(path)
}

/// コード値の辞書
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDictionary {
    Gender,
    PositionBeforeAfter,
    Boolean01,
    Market,
}

impl ValueDictionary {
    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ValueDictionary::Gender => &[("1", "男性"), ("2", "女性")],
            ValueDictionary::PositionBeforeAfter => &[("1", "法人格前"), ("2", "法人格後")],
            ValueDictionary::Boolean01 => &[("0", "なし"), ("1", "あり")],
            ValueDictionary::Market => &[
                ("1", "東証プライム"),
                ("2", "東証スタンダード"),
                ("3", "東証グロース"),
                ("9", "非上場"),
            ],
        }
    }

    /// 辞書にあれば名称、なければ元の値
    pub fn lookup<'a>(&self, code: &'a str) -> &'a str {
        self.entries()
            .iter()
            .find(|(k, _)| *k == code)
            .map(|(_, v)| *v)
            .unwrap_or(code)
    }
}

const DASH: &str = "-";

/// 空白のみ・未設定は "-"
pub fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => DASH.to_string(),
    }
}

/// YYYYMMDD → YYYY/MM/DD
pub fn format_ymd(value: Option<&str>) -> String {
    match value {
        Some(s) if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}/{}/{}", &s[..4], &s[4..6], &s[6..])
        }
        other => or_dash(other),
    }
}

/// YYYYMM → YYYY/MM
pub fn format_ym(value: Option<&str>) -> String {
    match value {
        Some(s) if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}/{}", &s[..4], &s[4..])
        }
        other => or_dash(other),
    }
}

/// 3桁区切り
pub fn format_int(value: Option<i64>) -> String {
    value.map(group_digits).unwrap_or_else(|| DASH.to_string())
}

pub fn format_k_yen(value: Option<i64>) -> String {
    value
        .map(|n| format!("{} 千円", group_digits(n)))
        .unwrap_or_else(|| DASH.to_string())
}

pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|n| format!("{}%", n))
        .unwrap_or_else(|| DASH.to_string())
}

/// 電話番号（空白を除去）
pub fn format_tel(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.chars().filter(|c| !c.is_whitespace()).collect(),
        _ => DASH.to_string(),
    }
}

/// 一覧表示用の資本金（千円単位の値を億円・万円・千円で表記）
pub fn format_capital(capital_k: Option<i64>) -> String {
    match capital_k {
        None | Some(0) => DASH.to_string(),
        Some(k) if k >= 100_000 => {
            // 小数点1桁まで
            let tenths = (k as f64 / 10_000.0).round() as i64;
            if tenths % 10 == 0 {
                format!("{}億円", group_digits(tenths / 10))
            } else {
                format!("{}.{}億円", group_digits(tenths / 10), tenths % 10)
            }
        }
        Some(k) if k >= 10 => {
            if k % 10 == 0 {
                format!("{}万円", group_digits(k / 10))
            } else {
                format!("{}.{}万円", group_digits(k / 10), k % 10)
            }
        }
        Some(k) => format!("{}千円", k),
    }
}

fn group_digits(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
