//! Prompt text for the tutor persona.

use workshop_common::models::{Account, Rank};

pub fn encouragement_prompt(account: &Account, rank: &Rank) -> String {
    format!(
        r#"你是一位溫暖幽默的「學習工坊」導師。
目前學生的資訊：
- 名字：{name}
- 目前稱號：{rank}
- 目前剩餘點數：{balance}
- 累計獲得點數：{total}

請寫一段簡短（30-50字）的鼓勵話語，讚美他的成就並鼓勵他繼續學習或去商城兌換獎勵。
請使用親切的語氣。"#,
        name = account.name,
        rank = rank.name,
        balance = account.balance,
        total = account.total_earned,
    )
}

pub fn daily_mission_prompt(account: &Account) -> String {
    format!(
        r#"請為「學習工坊」的用戶生成一個今日隨機學習任務。
用戶目前等級：{total} 點。

請以 JSON 格式輸出：
{{
  "title": "任務名稱",
  "description": "任務具體內容（例如：閱讀一篇科技文章並寫下心得）",
  "points": 獎勵點數 (50-200 之間)
}}"#,
        total = account.total_earned,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use workshop_common::models::RoleAccount;
    use workshop_common::models::rank::rank_for;

    #[test]
    fn encouragement_prompt_mentions_standing() {
        let mut account = RoleAccount::Guest.account();
        account.name = "小明".into();
        account.balance = 120;
        account.total_earned = 640;
        let prompt = encouragement_prompt(&account, rank_for(640));
        assert!(prompt.contains("小明"));
        assert!(prompt.contains("積極求知者"));
        assert!(prompt.contains("120"));
        assert!(prompt.contains("640"));
    }
}
