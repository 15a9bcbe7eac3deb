//! Fixed mentor instructions and the analysis prompt template

use crate::brief::{Brief, BriefError};

/// Persona and policy for the DGI email mentor
pub const MENTOR_SYSTEM_INSTRUCTION: &str = r#"
Du er en strategisk kommunikationsmentor og email-marketing ekspert for DGI. Din opgave er at guide koordinatorer til at sende professionelle, lovlige og effektive mails.

FØLG DISSE REGLER SLAVISK:

1. JURIDISKE REGLER FOR KONTAKT (MARKETING PERMISSIONS):
- Formænd: Må altid kontaktes (ingen permission påkrævet).
- Trænere, instruktører, frivillige, udøvere: SKAL have givet marketing permission (MP).
- Service-reglen (Undtagelse): Kontakt til tidligere deltagere om lignende arrangementer eller overbygninger (fx "Træner 2" efter "Træner 1") er OK uden ny permission.
Valider altid målgruppen i dit output.

2. SEGMENTERINGS-KATALOG (Anbefal disse):
- Idrætsgrene, Geografi (lokalområde), Foreningstype/størrelse, Aldersgrupper, Adfærdsdata (retargeting), Historik (tidligere kurser).

3. DGI TONE OF VOICE:
- Modtagerorienteret: Fokus på "what's in it for me".
- Direkte og i øjenhøjde: Brug "du", "I", "vi", "jeg". Undgå "disse", "denne", "man".
- Præcis: Skær ind til benet, brug overskrifter og punktform.
- Konkret: Brug eksempler og fakta.
- Motiverende: Brug bydeform og tydelig CTA.
- Handlekraftig: Brug nutid og aktiver.
- Glimt i øjet: Brug metaforer og humor (seriøst men levende).

4. STRUKTUR:
- Ét hovedbudskab pr. mail.
- Kunderejse: Hvis "Klar til handling" er NEJ -> Inspiration/hjælp. Hvis JA -> Salg/tilmelding.
"#;

const CHAT_SUFFIX: &str = "\n\nDu er nu i en dialog med brugeren. Du har lige givet dem feedback på deres email-udkast. Svar hjælpsomt, pædagogisk og uddybende på deres spørgsmål med DGI's Tone of Voice.";

/// System instruction for the follow-up dialogue
pub fn chat_system_instruction() -> String {
    format!("{MENTOR_SYSTEM_INSTRUCTION}{CHAT_SUFFIX}")
}

/// Render the one-shot analysis prompt. Fields are embedded verbatim.
pub fn build_analysis_prompt(brief: &Brief) -> Result<String, BriefError> {
    brief.validate()?;
    let ready = if brief.is_ready_for_action { "Ja" } else { "Nej" };
    Ok(format!(
        "Input fra bruger:\n\
         Målgruppe: {}\n\
         Formål: {}\n\
         Er de klar til handling (varm lead)? {}\n\
         Værdi: {}\n\
         Udkast: {}\n\
         \n\
         Giv mig strategisk rådgivning, feedback og et optimeret udkast. Svar i JSON format.",
        brief.target_group, brief.purpose, ready, brief.value, brief.draft
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::BriefField;

    fn brief() -> Brief {
        Brief {
            target_group: "Trænere".into(),
            purpose: "Tilmelding til kursus".into(),
            is_ready_for_action: true,
            value: "Spar tid".into(),
            draft: "Kom til kursus\n\nMed venlig hilsen\n  Instruktørteamet".into(),
        }
    }

    #[test]
    fn prompt_embeds_every_field_verbatim() {
        let b = brief();
        let prompt = build_analysis_prompt(&b).unwrap();
        for value in [&b.target_group, &b.purpose, &b.value, &b.draft] {
            assert!(prompt.contains(value.as_str()), "missing {value:?}");
        }
        assert!(prompt.contains("(varm lead)? Ja"));
        assert!(prompt.ends_with("Svar i JSON format."));
    }

    #[test]
    fn not_ready_renders_nej() {
        let mut b = brief();
        b.is_ready_for_action = false;
        assert!(build_analysis_prompt(&b).unwrap().contains("(varm lead)? Nej"));
    }

    #[test]
    fn long_draft_is_not_truncated() {
        let mut b = brief();
        b.draft = "Lang tekst. ".repeat(2_000);
        assert!(build_analysis_prompt(&b).unwrap().contains(&b.draft));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(
            build_analysis_prompt(&brief()).unwrap(),
            build_analysis_prompt(&brief()).unwrap()
        );
    }

    #[test]
    fn invalid_brief_produces_no_prompt() {
        let mut b = brief();
        b.purpose.clear();
        assert_eq!(
            build_analysis_prompt(&b),
            Err(BriefError::MissingField(BriefField::Purpose))
        );
    }

    #[test]
    fn chat_instruction_extends_system_instruction() {
        let chat = chat_system_instruction();
        assert!(chat.starts_with(MENTOR_SYSTEM_INSTRUCTION));
        assert!(chat.ends_with("DGI's Tone of Voice."));
    }
}
