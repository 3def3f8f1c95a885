use qifiolib::{
    formats::{csv::TemplateCsv, qif::Qif},
    template::MappingTemplate,
    traits::{ReadFormat, WriteFormat},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: банковские записи QIF -> CSV по шаблону generic_bank (stdin -> stdout)
    let doc = Qif.read(std::io::BufReader::new(std::io::stdin()))?;
    let template = MappingTemplate::generic_bank();
    let section = doc
        .first_section_of(template.account_kind)
        .ok_or("no bank transactions in input")?;
    TemplateCsv::new(&template).write(std::io::stdout(), &section.transactions)?;
    Ok(())
}
